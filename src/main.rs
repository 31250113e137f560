mod actions;
mod config;
mod domain;
mod insights;
mod picker;
mod storage;
mod streak;
mod ui;

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use rand::thread_rng;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::actions::{add_task, complete_task, delete_task, log_mood};
use crate::config::{load_config, resolve_config_path, resolve_data_dir};
use crate::domain::{
	EnergyCategory, EnergyFilter, Priority, Task, TaskFilter, local_now, mood_emoji, timestamp,
};
use crate::insights::{DashboardMetrics, energy_distribution, priority_distribution, recent_moods};
use crate::picker::{PickOutcome, candidates, pick};
use crate::storage::Stores;
use crate::streak::{daily_counts, streak};
use crate::ui::run_dashboard;

const LOG_FILE: &str = "focusflow.log";
const ANALYTICS_BAR_WIDTH: usize = 24;
const MAX_ANALYTICS_DAYS: i64 = 3650;

#[derive(Debug, Parser)]
#[command(name = "focusflow", about = "Task picker and mood tracker for the terminal")]
struct Cli {
	#[arg(long, global = true)]
	data_dir: Option<PathBuf>,
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	AddTask {
		#[arg(long)]
		name: String,
		#[arg(long, value_enum)]
		energy: EnergyCategory,
		#[arg(long, value_enum, default_value_t = Priority::Medium)]
		priority: Priority,
		#[arg(long, default_value_t = 30)]
		duration: u32,
	},
	ListTasks {
		#[arg(long, value_enum)]
		priority: Vec<Priority>,
		#[arg(long, value_enum, default_value_t = EnergyFilter::Any)]
		energy: EnergyFilter,
	},
	Complete {
		#[arg(long)]
		id: String,
	},
	Delete {
		#[arg(long)]
		id: String,
	},
	Pick {
		#[arg(long, value_enum)]
		energy: Option<EnergyFilter>,
		#[arg(long)]
		time: Option<u32>,
		#[arg(long)]
		complete: bool,
	},
	LogMood {
		#[arg(long)]
		mood: u8,
		#[arg(long)]
		note: Option<String>,
	},
	Moods {
		#[arg(long, default_value_t = 10)]
		limit: usize,
	},
	Stats,
	Analytics {
		#[arg(long, default_value_t = 14, value_parser = clap::value_parser!(i64).range(1..=MAX_ANALYTICS_DAYS))]
		days: i64,
	},
	Config,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let config_path = resolve_config_path(cli.config);
	let config = load_config(config_path.as_deref())?;
	let data_dir = resolve_data_dir(cli.data_dir, &config);
	let command = cli.command.unwrap_or(Command::Dashboard);

	let log_path = matches!(command, Command::Dashboard).then(|| data_dir.join(LOG_FILE));
	init_tracing(cli.verbose, log_path.as_deref());
	debug!(data_dir = %data_dir.display(), "resolved data directory");

	let mut stores = Stores::open(&data_dir);
	let now = local_now();

	match command {
		Command::Init => {
			stores.save_all()?;
			println!("initialized data directory at {}", data_dir.display());
			for path in [stores.tasks.path(), stores.moods.path(), stores.completions.path()] {
				println!("  {}", path.display());
			}
		}
		Command::Dashboard => {
			run_dashboard(&mut stores, &config)?;
		}
		Command::AddTask {
			name,
			energy,
			priority,
			duration,
		} => {
			let task = add_task(&mut stores.tasks, &name, energy, priority, duration, now)?;
			println!("created task {}", task.id);
		}
		Command::ListTasks { priority, energy } => {
			let filter = TaskFilter {
				priorities: priority,
				energy,
			};
			print_tasks(&stores, &filter);
		}
		Command::Complete { id } => {
			let task = complete_task(&mut stores.tasks, &mut stores.completions, &id, now)?;
			println!("completed {}", task.name);
		}
		Command::Delete { id } => {
			let task = delete_task(&mut stores.tasks, &id)?;
			println!("deleted {}", task.name);
		}
		Command::Pick {
			energy,
			time,
			complete,
		} => {
			let energy = energy.unwrap_or(config.default_energy);
			let time_budget = time.unwrap_or(config.default_time_budget);
			run_pick(&mut stores, energy, time_budget, complete)?;
		}
		Command::LogMood { mood, note } => {
			let entry = log_mood(&mut stores.moods, mood, note, now)?;
			println!("logged mood {}/10 {}", entry.mood, mood_emoji(entry.mood));
		}
		Command::Moods { limit } => {
			print_moods(&stores, limit);
		}
		Command::Stats => {
			print_stats(&stores);
		}
		Command::Analytics { days } => {
			print_analytics(&stores, days);
		}
		Command::Config => {
			print!("{}", toml::to_string_pretty(&config)?);
			println!("# data directory: {}", data_dir.display());
			if let Some(path) = &config_path {
				println!("# config file: {}", path.display());
			}
		}
	}

	Ok(())
}

fn init_tracing(verbose: bool, log_path: Option<&Path>) {
	let level = if verbose {
		"debug"
	} else if log_path.is_some() {
		"info"
	} else {
		"warn"
	};
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("focusflow={level},warn")));
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

	// The dashboard owns the terminal, so its logs go to a file instead.
	match log_path {
		Some(path) => {
			if let Some(file) = open_log_file(path) {
				builder.with_ansi(false).with_writer(Mutex::new(file)).init();
			}
		}
		None => builder.with_writer(std::io::stderr).init(),
	}
}

fn open_log_file(path: &Path) -> Option<fs::File> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).ok()?;
	}
	OpenOptions::new().create(true).append(true).open(path).ok()
}

fn run_pick(
	stores: &mut Stores,
	energy: EnergyFilter,
	time_budget: u32,
	complete: bool,
) -> Result<(), Box<dyn Error>> {
	let matched = candidates(stores.tasks.tasks(), energy, time_budget).len();
	let chosen = match pick(stores.tasks.tasks(), energy, time_budget, &mut thread_rng()) {
		PickOutcome::Picked(task) => task.clone(),
		PickOutcome::NoMatch => {
			warn!(energy = energy.label(), time_budget, "no task matched");
			println!(
				"warning: no tasks match energy {} within {time_budget} min; try adjusting your filters",
				energy.label()
			);
			return Ok(());
		}
	};

	println!("your next task: {}", chosen.name);
	println!("  {}", chosen.summary());
	println!("  id {} (picked from {matched} matching tasks)", chosen.id);

	if complete {
		complete_task(&mut stores.tasks, &mut stores.completions, &chosen.id, local_now())?;
		println!("completed {}", chosen.name);
	}

	Ok(())
}

fn print_tasks(stores: &Stores, filter: &TaskFilter) {
	let total = stores.tasks.tasks().len();
	if total == 0 {
		println!("no tasks yet");
		return;
	}

	let rows = stores.tasks.filter(filter);
	println!("showing {} of {} tasks", rows.len(), total);
	for task in rows {
		print_task_row(task);
	}
}

fn print_task_row(task: &Task) {
	println!(
		"{} | {} | {} | {} min | {} | added {}",
		task.id,
		task.name,
		task.category,
		task.duration,
		task.priority,
		task.created.format(timestamp::FORMAT)
	);
}

fn print_moods(stores: &Stores, limit: usize) {
	let entries = stores.moods.entries();
	if entries.is_empty() {
		println!("no mood data yet");
		return;
	}

	for entry in recent_moods(entries, limit).iter().rev() {
		println!(
			"{} | {:>2}/10 {} | {}",
			entry.date.format(timestamp::FORMAT),
			entry.mood,
			mood_emoji(entry.mood),
			entry.note.as_deref().unwrap_or("no note")
		);
	}
}

fn print_stats(stores: &Stores) {
	let today = Local::now().date_naive();
	let events = stores.completions.events();
	let metrics = DashboardMetrics::compute(
		stores.tasks.tasks(),
		stores.moods.entries(),
		events,
		today,
	);

	println!("active tasks:    {}", metrics.active_tasks);
	println!("high priority:   {}", metrics.high_priority);
	println!("completed today: {}", metrics.completed_today);
	println!("average mood:    {:.1}/10", metrics.average_mood);
	println!("total time:      {} min", stores.completions.total_time());

	if events.is_empty() {
		println!("complete tasks to see your streak");
		return;
	}

	let summary = streak(events, today);
	println!("current streak:  {} days", summary.current_streak);
	println!("total completed: {}", summary.total_completed);
	println!("best day:        {}", summary.best_day_count);
}

fn print_analytics(stores: &Stores, days: i64) {
	let tasks = stores.tasks.tasks();
	println!("tasks by priority:");
	for (priority, count) in priority_distribution(tasks) {
		println!("  {:<12} {:>3} {}", priority.label(), count, bar(count, tasks.len()));
	}

	println!("\ntasks by energy:");
	for (category, count) in energy_distribution(tasks) {
		println!("  {:<12} {:>3} {}", category.label(), count, bar(count, tasks.len()));
	}

	let today = Local::now().date_naive();
	let first_day = first_analytics_day(today, days);
	let counts = daily_counts(stores.completions.events());
	let busiest = counts.values().copied().max().unwrap_or(0);

	println!("\ncompleted per day:");
	if counts.is_empty() {
		println!("  no completed tasks yet");
		return;
	}
	for (day, count) in counts.range(first_day..=today) {
		println!("  {} {:>3} {}", day.format("%a %d %b"), count, bar(*count, busiest));
	}
}

/// First day of a window of `days` days ending today, clamped to the calendar.
fn first_analytics_day(today: NaiveDate, days: i64) -> NaiveDate {
	Duration::try_days(days.max(1) - 1)
		.and_then(|span| today.checked_sub_signed(span))
		.unwrap_or(NaiveDate::MIN)
}

fn bar(value: usize, max: usize) -> String {
	if value == 0 || max == 0 {
		return String::new();
	}
	let width = ((value as f64 / max as f64) * ANALYTICS_BAR_WIDTH as f64).round() as usize;
	"=".repeat(width.max(1))
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;
	use clap::Parser;

	use crate::storage::Stores;

	use super::{Cli, Command, first_analytics_day, print_analytics};

	fn today() -> NaiveDate {
		NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
	}

	#[test]
	fn analytics_window_ends_today() {
		assert_eq!(first_analytics_day(today(), 1), today());
		assert_eq!(first_analytics_day(today(), 14), NaiveDate::from_ymd_opt(2026, 5, 7).unwrap());
		assert_eq!(first_analytics_day(today(), 0), today());
	}

	#[test]
	fn huge_analytics_windows_clamp_instead_of_overflowing() {
		assert_eq!(first_analytics_day(today(), 1_000_000_000), NaiveDate::MIN);
		assert_eq!(first_analytics_day(today(), i64::MAX), NaiveDate::MIN);

		let dir = tempfile::tempdir().expect("temp dir");
		let stores = Stores::open(dir.path());
		print_analytics(&stores, 1_000_000_000);
	}

	#[test]
	fn analytics_days_are_range_checked() {
		let cli = Cli::try_parse_from(["focusflow", "analytics", "--days", "30"]).expect("valid days");
		assert!(matches!(cli.command, Some(Command::Analytics { days: 30 })));

		assert!(Cli::try_parse_from(["focusflow", "analytics", "--days", "0"]).is_err());
		assert!(Cli::try_parse_from(["focusflow", "analytics", "--days", "1000000000"]).is_err());
	}
}
