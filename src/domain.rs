use std::fmt::{Display, Formatter};

use chrono::{Local, NaiveDateTime, Timelike};
use clap::ValueEnum;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const ID_LEN: usize = 8;

pub const MIN_DURATION_MINUTES: u32 = 5;
pub const MAX_DURATION_MINUTES: u32 = 300;
pub const MIN_MOOD: u8 = 1;
pub const MAX_MOOD: u8 = 10;

/// Upper bound (inclusive) of each mood bracket and its face.
const MOOD_EMOJI: [(u8, &str); 5] = [(2, "😢"), (4, "😕"), (6, "😐"), (8, "🙂"), (10, "😄")];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task name is required")]
    EmptyName,
    #[error("duration must be between 5 and 300 minutes, got {0}")]
    DurationOutOfRange(u32),
    #[error("mood must be between 1 and 10, got {0}")]
    MoodOutOfRange(u8),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Display order, most urgent first.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Relative likelihood of being drawn by the picker.
    pub fn weight(self) -> u32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 3,
            Priority::High => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
pub enum EnergyCategory {
    #[serde(rename = "Low energy")]
    #[value(name = "low")]
    LowEnergy,
    #[serde(rename = "High energy")]
    #[value(name = "high")]
    HighEnergy,
}

impl EnergyCategory {
    pub const ALL: [EnergyCategory; 2] = [EnergyCategory::LowEnergy, EnergyCategory::HighEnergy];

    pub fn label(self) -> &'static str {
        match self {
            EnergyCategory::LowEnergy => "Low energy",
            EnergyCategory::HighEnergy => "High energy",
        }
    }
}

impl Display for EnergyCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EnergyFilter {
    #[default]
    Any,
    #[serde(rename = "low")]
    #[value(name = "low")]
    LowEnergy,
    #[serde(rename = "high")]
    #[value(name = "high")]
    HighEnergy,
}

impl EnergyFilter {
    pub const ALL: [EnergyFilter; 3] = [
        EnergyFilter::Any,
        EnergyFilter::LowEnergy,
        EnergyFilter::HighEnergy,
    ];

    pub fn matches(self, category: EnergyCategory) -> bool {
        match self {
            EnergyFilter::Any => true,
            EnergyFilter::LowEnergy => category == EnergyCategory::LowEnergy,
            EnergyFilter::HighEnergy => category == EnergyCategory::HighEnergy,
        }
    }

    pub fn next(self) -> Self {
        match self {
            EnergyFilter::Any => EnergyFilter::LowEnergy,
            EnergyFilter::LowEnergy => EnergyFilter::HighEnergy,
            EnergyFilter::HighEnergy => EnergyFilter::Any,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EnergyFilter::Any => "Any",
            EnergyFilter::LowEnergy => "Low energy",
            EnergyFilter::HighEnergy => "High energy",
        }
    }
}

impl From<EnergyCategory> for EnergyFilter {
    fn from(category: EnergyCategory) -> Self {
        match category {
            EnergyCategory::LowEnergy => EnergyFilter::LowEnergy,
            EnergyCategory::HighEnergy => EnergyFilter::HighEnergy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Empty for records written before ids existed; the task store fills it in.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: EnergyCategory,
    pub priority: Priority,
    pub duration: u32,
    #[serde(with = "timestamp")]
    pub created: NaiveDateTime,
}

impl Task {
    pub fn new(
        name: &str,
        category: EnergyCategory,
        priority: Priority,
        duration: u32,
        created: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        let task = Self {
            id: generate_id(),
            name: name.trim().to_string(),
            category,
            priority,
            duration,
            created,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration) {
            return Err(ValidationError::DurationOutOfRange(self.duration));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} | {} min | {} priority",
            self.category, self.duration, self.priority
        )
    }
}

/// Task list filter: allowed priorities (empty means all) and energy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub priorities: Vec<Priority>,
    pub energy: EnergyFilter,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let priority_ok = self.priorities.is_empty() || self.priorities.contains(&task.priority);
        priority_ok && self.energy.matches(task.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,
    pub mood: u8,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub note: Option<String>,
}

impl MoodEntry {
    pub fn new(
        mood: u8,
        note: Option<String>,
        date: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        if !(MIN_MOOD..=MAX_MOOD).contains(&mood) {
            return Err(ValidationError::MoodOutOfRange(mood));
        }

        let note = note
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Ok(Self { date, mood, note })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub name: String,
    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,
}

impl CompletionEvent {
    pub fn new(name: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }
}

pub fn mood_emoji(mood: u8) -> &'static str {
    MOOD_EMOJI
        .iter()
        .find(|(upper, _)| mood <= *upper)
        .map(|(_, emoji)| *emoji)
        .unwrap_or("😄")
}

/// Current local wall-clock time at the minute precision the files store.
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|value| value.with_nanosecond(0))
        .unwrap_or(now)
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|note| !note.trim().is_empty()))
}

/// Local timestamps stored as `YYYY-MM-DD HH:MM`.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M";
    const ACCEPTED_FORMATS: [&str; 3] = [FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        ACCEPTED_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }
}
