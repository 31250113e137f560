use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{CompletionEvent, MoodEntry, Task, TaskFilter, generate_id};

pub const TASKS_FILE: &str = "tasks.json";
pub const MOOD_FILE: &str = "mood.json";
pub const STATS_FILE: &str = "stats.json";

const JSON_INDENT: &[u8] = b"    ";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of the stats file. `total_time` is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDocument {
    #[serde(default)]
    pub completed: Vec<CompletionEvent>,
    #[serde(default)]
    pub total_time: i64,
}

/// Reads a JSON document. A missing or blank file yields `None`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Like [`read_json`], but any read failure falls back to the default.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(path = %path.display(), "no data yet, starting empty");
            T::default()
        }
        Err(err) => {
            warn!(%err, "unreadable data file, starting empty");
            T::default()
        }
    }
}

/// Writes the document to a sibling temp file and renames it into place, so
/// the previous contents survive any failure before the rename.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let io_error = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| StorageError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    buffer.push(b'\n');

    let temp_path = temp_path_for(path);
    let written = write_and_sync(&temp_path, &buffer).and_then(|()| fs::rename(&temp_path, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(err));
    }

    debug!(path = %path.display(), bytes = buffer.len(), "saved");
    Ok(())
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tasks: Vec<Task> = load_or_default(&path);
        tasks.retain(|task| match task.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.display(), task = %task.name, %err, "dropping invalid task");
                false
            }
        });

        let mut assigned = 0;
        for task in tasks.iter_mut().filter(|task| task.id.is_empty()) {
            task.id = generate_id();
            assigned += 1;
        }

        let store = Self { path, tasks };
        // write generated ids back
        if assigned > 0 {
            match store.save() {
                Ok(()) => info!(path = %store.path.display(), assigned, "assigned ids to legacy tasks"),
                Err(err) => warn!(%err, assigned, "could not persist ids for legacy tasks"),
            }
        }
        store
    }

    pub fn save(&self) -> Result<(), StorageError> {
        save_json(&self.path, &self.tasks)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn filter(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|task| filter.matches(task)).collect()
    }

    pub fn append(&mut self, task: Task) -> Result<(), StorageError> {
        self.tasks.push(task);
        self.save()
    }

    /// Removes the task in memory and persists. `Ok(None)` when no task has
    /// that id; nothing is written in that case.
    pub fn remove(&mut self, id: &str) -> Result<Option<Task>, StorageError> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(None);
        };
        let task = self.tasks.remove(index);
        self.save()?;
        Ok(Some(task))
    }
}

#[derive(Debug, Clone)]
pub struct MoodStore {
    path: PathBuf,
    entries: Vec<MoodEntry>,
}

impl MoodStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_or_default(&path);
        Self { path, entries }
    }

    pub fn save(&self) -> Result<(), StorageError> {
        save_json(&self.path, &self.entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    pub fn append(&mut self, entry: MoodEntry) -> Result<(), StorageError> {
        self.entries.push(entry);
        self.save()
    }
}

#[derive(Debug, Clone)]
pub struct CompletionLog {
    path: PathBuf,
    document: StatsDocument,
}

impl CompletionLog {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = load_or_default(&path);
        Self { path, document }
    }

    pub fn save(&self) -> Result<(), StorageError> {
        save_json(&self.path, &self.document)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events(&self) -> &[CompletionEvent] {
        &self.document.completed
    }

    pub fn total_time(&self) -> i64 {
        self.document.total_time
    }

    pub fn append(&mut self, event: CompletionEvent) -> Result<(), StorageError> {
        self.document.completed.push(event);
        self.save()
    }
}

/// The three stores of one data directory.
#[derive(Debug, Clone)]
pub struct Stores {
    pub tasks: TaskStore,
    pub moods: MoodStore,
    pub completions: CompletionLog,
}

impl Stores {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            tasks: TaskStore::load(data_dir.join(TASKS_FILE)),
            moods: MoodStore::load(data_dir.join(MOOD_FILE)),
            completions: CompletionLog::load(data_dir.join(STATS_FILE)),
        }
    }

    pub fn save_all(&self) -> Result<(), StorageError> {
        self.tasks.save()?;
        self.moods.save()?;
        self.completions.save()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;

    use crate::domain::{
        CompletionEvent, EnergyCategory, EnergyFilter, MoodEntry, Priority, Task, TaskFilter,
    };

    use super::{
        CompletionLog, MOOD_FILE, MoodStore, STATS_FILE, StatsDocument, StorageError, Stores,
        TASKS_FILE, TaskStore, read_json, save_json,
    };

    fn at(day: u32, hour: u32, minute: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample_task(name: &str, priority: Priority, category: EnergyCategory) -> Task {
        Task::new(name, category, priority, 25, at(1, 8, 30)).expect("valid task")
    }

    #[test]
    fn round_trips_each_store() {
        let dir = tempfile::tempdir().expect("temp dir");

        let mut tasks = TaskStore::load(dir.path().join(TASKS_FILE));
        tasks
            .append(sample_task("Plan week", Priority::High, EnergyCategory::HighEnergy))
            .expect("save tasks");
        tasks
            .append(sample_task("Water plants", Priority::Low, EnergyCategory::LowEnergy))
            .expect("save tasks");

        let mut moods = MoodStore::load(dir.path().join(MOOD_FILE));
        moods
            .append(MoodEntry::new(6, Some("tired".to_string()), at(1, 21, 0)).unwrap())
            .expect("save moods");
        moods
            .append(MoodEntry::new(9, None, at(2, 21, 5)).unwrap())
            .expect("save moods");

        let mut log = CompletionLog::load(dir.path().join(STATS_FILE));
        log.append(CompletionEvent::new("Stretch", at(2, 7, 45)))
            .expect("save log");

        let reopened = Stores::open(dir.path());
        assert_eq!(reopened.tasks.tasks(), tasks.tasks());
        assert_eq!(reopened.moods.entries(), moods.entries());
        assert_eq!(reopened.completions.events(), log.events());
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let stores = Stores::open(dir.path());
        assert!(stores.tasks.tasks().is_empty());
        assert!(stores.moods.entries().is_empty());
        assert!(stores.completions.events().is_empty());
        assert_eq!(stores.completions.total_time(), 0);
    }

    #[test]
    fn corrupted_files_load_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(TASKS_FILE), "[{\"name\": ").unwrap();
        fs::write(dir.path().join(MOOD_FILE), "not json").unwrap();
        fs::write(dir.path().join(STATS_FILE), "{\"completed\": 3}").unwrap();

        let stores = Stores::open(dir.path());
        assert!(stores.tasks.tasks().is_empty());
        assert!(stores.moods.entries().is_empty());
        assert!(stores.completions.events().is_empty());

        let err = read_json::<Vec<Task>>(&dir.path().join(TASKS_FILE))
            .expect_err("truncated json is an error");
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[test]
    fn carries_total_time_through_saves() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(STATS_FILE);
        fs::write(
            &path,
            r#"{"completed": [{"name": "Old", "date": "2026-01-05 10:00"}], "total_time": 95}"#,
        )
        .unwrap();

        let mut log = CompletionLog::load(&path);
        assert_eq!(log.total_time(), 95);
        log.append(CompletionEvent::new("New", at(3, 12, 0)))
            .expect("save log");

        let document: StatsDocument = read_json(&path).unwrap().expect("document exists");
        assert_eq!(document.total_time, 95);
        assert_eq!(document.completed.len(), 2);
    }

    #[test]
    fn drops_tasks_that_break_invariants() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(TASKS_FILE);
        fs::write(
            &path,
            r#"[
                {"name": "Fine", "category": "Low energy", "priority": "Low", "duration": 30, "created": "2026-02-01 09:00"},
                {"name": "Too long", "category": "Low energy", "priority": "Low", "duration": 900, "created": "2026-02-01 09:00"},
                {"name": "  ", "category": "High energy", "priority": "High", "duration": 30, "created": "2026-02-01 09:00"}
            ]"#,
        )
        .unwrap();

        let store = TaskStore::load(&path);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].name, "Fine");
    }

    #[test]
    fn legacy_tasks_keep_their_ids_across_loads() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(TASKS_FILE);
        fs::write(
            &path,
            r#"[
                {"name": "Call plumber", "category": "Low energy", "priority": "High", "duration": 15, "created": "2026-02-01 09:00"},
                {"name": "Draft essay", "category": "High energy", "priority": "Medium", "duration": 90, "created": "2026-02-01 10:00"}
            ]"#,
        )
        .unwrap();

        let first = TaskStore::load(&path);
        let ids = first
            .tasks()
            .iter()
            .map(|task| task.id.clone())
            .collect::<Vec<_>>();
        assert!(ids.iter().all(|id| id.len() == 8));
        assert_ne!(ids[0], ids[1]);

        let mut second = TaskStore::load(&path);
        let reloaded = second
            .tasks()
            .iter()
            .map(|task| task.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(reloaded, ids);

        let removed = second.remove(&ids[0]).expect("save").expect("id is known");
        assert_eq!(removed.name, "Call plumber");
        assert_eq!(TaskStore::load(&path).tasks().len(), 1);
    }

    #[test]
    fn save_all_writes_every_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let data_dir = dir.path().join("nested").join("focusflow");
        let stores = Stores::open(&data_dir);
        stores.save_all().expect("init writes files");

        let tasks: Vec<Task> = read_json(&data_dir.join(TASKS_FILE)).unwrap().expect("tasks file");
        let moods: Vec<MoodEntry> = read_json(&data_dir.join(MOOD_FILE)).unwrap().expect("mood file");
        let stats: StatsDocument = read_json(&data_dir.join(STATS_FILE)).unwrap().expect("stats file");
        assert!(tasks.is_empty());
        assert!(moods.is_empty());
        assert_eq!(stats, StatsDocument::default());
    }

    #[test]
    fn removes_by_id_and_persists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(TASKS_FILE);
        let mut store = TaskStore::load(&path);
        let keep = sample_task("Keep", Priority::Medium, EnergyCategory::LowEnergy);
        let dropped = sample_task("Drop", Priority::Medium, EnergyCategory::LowEnergy);
        store.append(keep.clone()).unwrap();
        store.append(dropped.clone()).unwrap();

        assert_eq!(store.remove("missing").unwrap(), None);
        assert_eq!(store.remove(&dropped.id).unwrap(), Some(dropped));

        let reloaded = TaskStore::load(&path);
        assert_eq!(reloaded.tasks(), &[keep]);
    }

    #[test]
    fn filters_by_priority_and_energy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = TaskStore::load(dir.path().join(TASKS_FILE));
        store
            .append(sample_task("a", Priority::High, EnergyCategory::HighEnergy))
            .unwrap();
        store
            .append(sample_task("b", Priority::Low, EnergyCategory::HighEnergy))
            .unwrap();
        store
            .append(sample_task("c", Priority::High, EnergyCategory::LowEnergy))
            .unwrap();

        let filter = TaskFilter {
            priorities: vec![Priority::High],
            energy: EnergyFilter::HighEnergy,
        };
        let names = store
            .filter(&filter)
            .into_iter()
            .map(|task| task.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a"]);
        assert_eq!(store.filter(&TaskFilter::default()).len(), 3);
    }

    #[test]
    fn failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(TASKS_FILE);
        save_json(&path, &vec![sample_task("Kept", Priority::Low, EnergyCategory::LowEnergy)])
            .expect("first save");

        // A directory squatting on the temp name makes the write fail.
        fs::create_dir(dir.path().join(format!("{TASKS_FILE}.tmp"))).unwrap();
        let err = save_json(&path, &Vec::<Task>::new()).expect_err("write should fail");
        assert!(matches!(err, StorageError::Io { .. }));

        let tasks: Vec<Task> = read_json(&path).unwrap().expect("file still present");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Kept");
    }

    #[test]
    fn writes_four_space_indented_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(STATS_FILE);
        save_json(&path, &StatsDocument::default()).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n    \"completed\": []"));
    }
}
