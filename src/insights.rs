use chrono::NaiveDate;

use crate::domain::{CompletionEvent, EnergyCategory, MoodEntry, Priority, Task};
use crate::streak::completed_on;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    pub active_tasks: usize,
    pub completed_total: usize,
    pub completed_today: usize,
    pub average_mood: f64,
    pub last_mood: Option<u8>,
    pub high_priority: usize,
}

impl DashboardMetrics {
    pub fn compute(
        tasks: &[Task],
        moods: &[MoodEntry],
        events: &[CompletionEvent],
        today: NaiveDate,
    ) -> Self {
        Self {
            active_tasks: tasks.len(),
            completed_total: events.len(),
            completed_today: completed_on(events, today),
            average_mood: average_mood(moods),
            last_mood: moods.last().map(|entry| entry.mood),
            high_priority: tasks
                .iter()
                .filter(|task| task.priority == Priority::High)
                .count(),
        }
    }
}

/// Mean mood rounded to one decimal; 0.0 with no entries.
pub fn average_mood(moods: &[MoodEntry]) -> f64 {
    if moods.is_empty() {
        return 0.0;
    }
    let sum: u32 = moods.iter().map(|entry| u32::from(entry.mood)).sum();
    let mean = f64::from(sum) / moods.len() as f64;
    (mean * 10.0).round() / 10.0
}

pub fn priority_distribution(tasks: &[Task]) -> Vec<(Priority, usize)> {
    Priority::ALL
        .iter()
        .map(|priority| {
            let count = tasks.iter().filter(|task| task.priority == *priority).count();
            (*priority, count)
        })
        .collect()
}

pub fn energy_distribution(tasks: &[Task]) -> Vec<(EnergyCategory, usize)> {
    EnergyCategory::ALL
        .iter()
        .map(|category| {
            let count = tasks.iter().filter(|task| task.category == *category).count();
            (*category, count)
        })
        .collect()
}

pub fn recent_moods(moods: &[MoodEntry], limit: usize) -> &[MoodEntry] {
    &moods[moods.len().saturating_sub(limit)..]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::{CompletionEvent, EnergyCategory, MoodEntry, Priority, Task};

    use super::{
        DashboardMetrics, average_mood, energy_distribution, priority_distribution, recent_moods,
    };

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
    }

    fn mood(value: u8, on: u32) -> MoodEntry {
        MoodEntry::new(value, None, day(on).and_hms_opt(20, 0, 0).unwrap()).unwrap()
    }

    fn task(priority: Priority, category: EnergyCategory) -> Task {
        Task::new("t", category, priority, 30, day(1).and_hms_opt(8, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn averages_moods_to_one_decimal() {
        assert_eq!(average_mood(&[]), 0.0);
        assert_eq!(average_mood(&[mood(7, 1), mood(8, 2), mood(8, 3)]), 7.7);
        assert_eq!(average_mood(&[mood(5, 1), mood(6, 2)]), 5.5);
    }

    #[test]
    fn keeps_the_latest_moods() {
        let moods = (1..=10).map(|on| mood(on as u8, on)).collect::<Vec<_>>();
        let recent = recent_moods(&moods, 7);
        assert_eq!(recent.len(), 7);
        assert_eq!(recent[0].mood, 4);
        assert_eq!(recent_moods(&moods[..3], 7).len(), 3);
    }

    #[test]
    fn summarises_the_dashboard() {
        let tasks = vec![
            task(Priority::High, EnergyCategory::HighEnergy),
            task(Priority::High, EnergyCategory::LowEnergy),
            task(Priority::Low, EnergyCategory::LowEnergy),
        ];
        let moods = vec![mood(4, 1), mood(9, 2)];
        let events = vec![
            CompletionEvent::new("a", day(2).and_hms_opt(9, 0, 0).unwrap()),
            CompletionEvent::new("b", day(3).and_hms_opt(9, 0, 0).unwrap()),
            CompletionEvent::new("c", day(3).and_hms_opt(18, 0, 0).unwrap()),
        ];

        let metrics = DashboardMetrics::compute(&tasks, &moods, &events, day(3));
        assert_eq!(
            metrics,
            DashboardMetrics {
                active_tasks: 3,
                completed_total: 3,
                completed_today: 2,
                average_mood: 6.5,
                last_mood: Some(9),
                high_priority: 2,
            }
        );

        assert_eq!(
            priority_distribution(&tasks),
            vec![(Priority::High, 2), (Priority::Medium, 0), (Priority::Low, 1)]
        );
        assert_eq!(
            energy_distribution(&tasks),
            vec![(EnergyCategory::LowEnergy, 2), (EnergyCategory::HighEnergy, 1)]
        );
    }
}
