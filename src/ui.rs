use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{Duration, Local, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use rand::thread_rng;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::{Frame, Terminal};
use tracing::{info, warn};

use crate::actions::{add_task, complete_task, delete_task, log_mood};
use crate::config::Config;
use crate::domain::{
	EnergyCategory, EnergyFilter, MoodEntry, Priority, Task, TaskFilter, local_now, mood_emoji,
	timestamp, MAX_MOOD, MIN_MOOD,
};
use crate::insights::{DashboardMetrics, energy_distribution, priority_distribution, recent_moods};
use crate::picker::{PickOutcome, candidates, pick};
use crate::storage::Stores;
use crate::streak::{StreakSummary, daily_counts, streak};

const FOCUSED_TAB_COLOR: Color = Color::Yellow;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const RECENT_TASKS_SHOWN: usize = 5;
const DASHBOARD_MOODS_SHOWN: usize = 7;
const MOOD_HISTORY_SHOWN: usize = 14;
const MOOD_NOTES_SHOWN: usize = 5;
const COMPLETION_DAYS_SHOWN: i64 = 14;
const DEFAULT_TASK_DURATION: u32 = 30;
const PRIORITY_FILTERS: [&[Priority]; 5] = [
	&[],
	&[Priority::High],
	&[Priority::Medium],
	&[Priority::Low],
	&[Priority::High, Priority::Medium],
];

pub fn run_dashboard(stores: &mut Stores, config: &Config) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, stores, config);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	stores: &mut Stores,
	config: &Config,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(config);
	info!("dashboard opened");

	loop {
		let today = Local::now().date_naive();
		let view = build_view(&app, stores, today);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, stores),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, stores),
					InputMode::Normal => handle_normal_key(&mut app, key.code, stores, &view),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	info!("dashboard closed");
	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	render_tabs(frame, layout[0], app);
	match app.tab {
		Tab::Dashboard => render_dashboard_tab(frame, layout[1], view),
		Tab::Tasks => render_tasks_tab(frame, layout[1], app, view),
		Tab::Pick => render_pick_tab(frame, layout[1], app, view),
		Tab::Mood => render_mood_tab(frame, layout[1], view),
		Tab::Analytics => render_analytics_tab(frame, layout[1], view),
	}
	render_footer(frame, layout[2], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
	let titles = Tab::ALL
		.iter()
		.enumerate()
		.map(|(index, tab)| Line::from(format!("{} {}", index + 1, tab.title())))
		.collect::<Vec<_>>();
	let tabs = Tabs::new(titles)
		.block(Block::default().borders(Borders::ALL).title("FocusFlow"))
		.select(app.tab.index())
		.highlight_style(Style::default().fg(FOCUSED_TAB_COLOR).add_modifier(Modifier::BOLD));
	frame.render_widget(tabs, area);
}

fn render_dashboard_tab(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let rows = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(6)])
		.split(area);

	let cards = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage(25),
			Constraint::Percentage(25),
			Constraint::Percentage(25),
			Constraint::Percentage(25),
		])
		.split(rows[0]);

	let metrics = &view.metrics;
	render_metric_card(frame, cards[0], "Total Tasks", metrics.active_tasks.to_string());
	render_metric_card(frame, cards[1], "Completed", metrics.completed_total.to_string());
	render_metric_card(frame, cards[2], "Avg Mood", format!("{:.1}/10", metrics.average_mood));
	render_metric_card(frame, cards[3], "High Priority", metrics.high_priority.to_string());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
		.split(rows[1]);

	let mut task_lines = view
		.task_rows
		.iter()
		.take(RECENT_TASKS_SHOWN)
		.map(|row| row.line.clone())
		.collect::<Vec<_>>();
	if view.task_total == 0 {
		task_lines.push(Line::from("No tasks yet. Press a to add your first task."));
	}
	let tasks = Paragraph::new(task_lines).block(Block::default().borders(Borders::ALL).title("Recent Tasks"));
	frame.render_widget(tasks, body[0]);

	let moods = recent_moods(&view.moods, DASHBOARD_MOODS_SHOWN);
	let mut mood_lines = vec![Line::from(format!(
		"Today: {} done | streak {} days",
		view.metrics.completed_today, view.streak.current_streak
	))];
	mood_lines.push(Line::from(""));
	if moods.is_empty() {
		mood_lines.push(Line::from("No mood data yet. Press m to log one."));
	} else {
		mood_lines.extend(moods.iter().map(mood_bar_line));
	}
	let mood_panel =
		Paragraph::new(mood_lines).block(Block::default().borders(Borders::ALL).title("Mood: Last 7"));
	frame.render_widget(mood_panel, body[1]);
}

fn render_metric_card(frame: &mut Frame, area: Rect, title: &str, value: String) {
	let card = Paragraph::new(Line::styled(value, Style::default().add_modifier(Modifier::BOLD)))
		.alignment(Alignment::Center)
		.block(Block::default().borders(Borders::ALL).title(title.to_string()));
	frame.render_widget(card, area);
}

fn render_tasks_tab(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = if view.task_rows.is_empty() {
		vec![ListItem::new(if view.task_total == 0 {
			"(no tasks yet)"
		} else {
			"(no tasks match this filter)"
		})]
	} else {
		view.task_rows
			.iter()
			.map(|row| ListItem::new(row.line.clone()))
			.collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !view.task_rows.is_empty() {
		state.select(Some(app.task_index.min(view.task_rows.len() - 1)));
	}

	let title = format!(
		"Your Tasks | showing {} of {} | energy: {} | priority: {}",
		view.task_rows.len(),
		view.task_total,
		app.task_filter.label(),
		priority_filter_label(&app.task_priorities)
	);
	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(title))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_pick_tab(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let rows = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(5), Constraint::Min(7), Constraint::Length(3)])
		.split(area);

	let constraints = Paragraph::new(vec![
		Line::from(format!("Energy level: {}", app.pick_energy.label())),
		Line::from(format!("Time available: {} min", app.pick_budget)),
		Line::from(format!("Matching tasks: {}", view.pick_candidates)),
	])
	.block(Block::default().borders(Borders::ALL).title("Constraints"));
	frame.render_widget(constraints, rows[0]);

	let mut lines = Vec::new();
	match (&app.pick, &view.picked) {
		(PickState::Picked { matched, .. }, Some(task)) => {
			lines.push(Line::from("Your next task:"));
			lines.push(Line::from(""));
			lines.push(Line::styled(
				task.name.clone(),
				priority_style(task.priority).add_modifier(Modifier::BOLD),
			));
			lines.push(Line::from(format!("Duration: {} minutes", task.duration)));
			lines.push(Line::from(format!("Priority: {}", task.priority)));
			lines.push(Line::from(format!("Energy: {}", task.category)));
			lines.push(Line::from(""));
			lines.push(Line::from(format!(
				"Drawn from {matched} matching tasks. Enter marks it complete, r picks again."
			)));
		}
		(PickState::Picked { .. }, None) => {
			lines.push(Line::from("The picked task is no longer in your list. Press p to pick again."));
		}
		(PickState::NoMatch, _) => {
			lines.push(Line::styled(
				"No tasks match your current energy level and available time. Try adjusting your filters!",
				Style::default().fg(Color::Yellow),
			));
		}
		(PickState::NotYet, _) => {
			if view.task_total == 0 {
				lines.push(Line::styled(
					"No tasks available. Add some tasks first!",
					Style::default().fg(Color::Yellow),
				));
			} else {
				lines.push(Line::from("Press p to choose your energy and time, or r to pick with the current ones."));
			}
		}
	}
	let result = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Smart Task Picker"));
	frame.render_widget(result, rows[1]);

	let mut spans = Vec::new();
	for (priority, count) in &view.priority_counts {
		if !spans.is_empty() {
			spans.push(Span::raw(" | "));
		}
		spans.push(Span::styled(format!("{priority} priority: {count}"), priority_style(*priority)));
	}
	let counts = Paragraph::new(Line::from(spans))
		.block(Block::default().borders(Borders::ALL).title("Available Tasks"));
	frame.render_widget(counts, rows[2]);
}

fn render_mood_tab(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let columns = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
		.split(area);

	let mut lines = Vec::new();
	match view.metrics.last_mood {
		Some(last) => {
			lines.push(Line::from(format!("Last mood: {last}/10 {}", mood_emoji(last))));
			lines.push(Line::from(format!("Average:   {:.1}/10", view.metrics.average_mood)));
		}
		None => lines.push(Line::from("No mood data yet")),
	}
	lines.push(Line::from(""));
	lines.push(Line::from("Recent Entries"));
	for entry in recent_moods(&view.moods, MOOD_NOTES_SHOWN).iter().rev() {
		lines.push(Line::styled(
			format!("{} - Mood: {}/10", entry.date.format(timestamp::FORMAT), entry.mood),
			Style::default().add_modifier(Modifier::BOLD),
		));
		lines.push(Line::from(format!("  {}", entry.note.as_deref().unwrap_or("No note"))));
	}
	let insights = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Mood Insights"));
	frame.render_widget(insights, columns[0]);

	let history = recent_moods(&view.moods, MOOD_HISTORY_SHOWN)
		.iter()
		.map(mood_bar_line)
		.collect::<Vec<_>>();
	let history = Paragraph::new(if history.is_empty() {
		vec![Line::from("(no entries)")]
	} else {
		history
	})
	.block(Block::default().borders(Borders::ALL).title("Mood History"));
	frame.render_widget(history, columns[1]);
}

fn render_analytics_tab(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let rows = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
		.split(area);
	let top = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
		.split(rows[0]);
	let bottom = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
		.split(rows[1]);

	let priority_rows = view
		.priority_counts
		.iter()
		.map(|(priority, count)| (priority.label().to_string(), *count as u64))
		.collect::<Vec<_>>();
	render_bar_chart(frame, top[0], "Tasks by Priority", &priority_rows, 8, Color::LightRed);

	let energy_rows = view
		.energy_counts
		.iter()
		.map(|(category, count)| (category.label().to_string(), *count as u64))
		.collect::<Vec<_>>();
	render_bar_chart(frame, top[1], "Tasks by Energy Level", &energy_rows, 11, Color::LightBlue);

	let daily_rows = view
		.daily
		.iter()
		.map(|(day, count)| (day.format("%d").to_string(), *count as u64))
		.collect::<Vec<_>>();
	render_bar_chart(
		frame,
		bottom[0],
		"Tasks Completed Per Day",
		&daily_rows,
		3,
		Color::LightGreen,
	);

	let lines = if view.streak.total_completed == 0 {
		vec![Line::from("Complete tasks to see your streak!")]
	} else {
		vec![
			Line::from(format!("Current Streak: {} days", view.streak.current_streak)),
			Line::from(format!("Total Completed: {}", view.streak.total_completed)),
			Line::from(format!("Best Day: {}", view.streak.best_day_count)),
		]
	};
	let streak_panel =
		Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Productivity Streak"));
	frame.render_widget(streak_panel, bottom[1]);
}

fn render_bar_chart(
	frame: &mut Frame,
	area: Rect,
	title: &str,
	rows: &[(String, u64)],
	bar_width: u16,
	color: Color,
) {
	let data = rows
		.iter()
		.map(|(label, value)| (label.as_str(), *value))
		.collect::<Vec<_>>();
	let chart = BarChart::default()
		.block(Block::default().borders(Borders::ALL).title(title.to_string()))
		.data(data.as_slice())
		.bar_width(bar_width)
		.bar_gap(1)
		.bar_style(Style::default().fg(color))
		.value_style(Style::default().fg(Color::Black).bg(color));
	frame.render_widget(chart, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab/1-5 switch view | j/k move | a add task | c complete | d delete | f energy | P priority | q quit"),
			Line::from("p pick task | r pick again | Enter complete picked task | m log mood"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from(format!("Enter submit | Esc cancel | {}", app.status)),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(50, 40, frame.area());
	frame.render_widget(Clear, area);

	let items = select
		.options
		.iter()
		.map(|option| ListItem::new(option.label.clone()).style(option.style))
		.collect::<Vec<_>>();

	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(select.title.clone()))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len() - 1)));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn mood_bar_line(entry: &MoodEntry) -> Line<'static> {
	Line::from(vec![
		Span::raw(format!("{} {:>2} {} ", entry.date.format("%d %b"), entry.mood, mood_emoji(entry.mood))),
		Span::styled("#".repeat(usize::from(entry.mood)), mood_style(entry.mood)),
	])
}

fn task_line(task: &Task) -> Line<'static> {
	Line::from(vec![
		Span::styled(format!("{:<6} ", task.priority.label()), priority_style(task.priority)),
		Span::styled(task.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
		Span::raw(format!(" | {} | {} min", task.category, task.duration)),
	])
}

fn priority_style(priority: Priority) -> Style {
	let color = match priority {
		Priority::High => Color::LightRed,
		Priority::Medium => Color::Yellow,
		Priority::Low => Color::LightGreen,
	};
	Style::default().fg(color)
}

fn mood_style(mood: u8) -> Style {
	let color = match mood {
		0..=3 => Color::LightRed,
		4..=6 => Color::Yellow,
		_ => Color::LightGreen,
	};
	Style::default().fg(color)
}

fn handle_normal_key(app: &mut App, code: KeyCode, stores: &mut Stores, view: &ViewModel) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Tab => {
			app.tab = app.tab.next();
			false
		}
		KeyCode::BackTab => {
			app.tab = app.tab.prev();
			false
		}
		KeyCode::Char(digit @ '1'..='5') => {
			let index = digit as usize - '1' as usize;
			app.tab = Tab::ALL[index];
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_task_selection(-1, view);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_task_selection(1, view);
			false
		}
		KeyCode::Char('f') => {
			app.task_filter = app.task_filter.next();
			app.task_index = 0;
			app.status = format!("Energy filter: {}", app.task_filter.label());
			false
		}
		KeyCode::Char('P') => {
			app.task_priorities = next_priority_filter(&app.task_priorities);
			app.task_index = 0;
			app.status = format!("Priority filter: {}", priority_filter_label(&app.task_priorities));
			false
		}
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new("Task name", PromptKind::TaskName));
			false
		}
		KeyCode::Char('m') => {
			app.mode = InputMode::Prompt(PromptState::new(
				format!("How are you feeling right now? ({MIN_MOOD}-{MAX_MOOD})"),
				PromptKind::MoodScore,
			));
			false
		}
		KeyCode::Char('p') => {
			app.mode = InputMode::Select(build_pick_energy_select(app.pick_energy));
			false
		}
		KeyCode::Char('r') => {
			app.status = roll_pick(app, stores);
			false
		}
		KeyCode::Char('c') => {
			let Some(task_id) = app.selected_task_id(view) else {
				app.status = "Select a task in the Tasks view first".to_string();
				return false;
			};
			app.status = match complete_task(&mut stores.tasks, &mut stores.completions, &task_id, local_now()) {
				Ok(task) => format!("Task completed: {}", task.name),
				Err(err) => report_error(err),
			};
			false
		}
		KeyCode::Char('d') => {
			let Some(task_id) = app.selected_task_id(view) else {
				app.status = "Select a task in the Tasks view first".to_string();
				return false;
			};
			let name = stores
				.tasks
				.get(&task_id)
				.map(|task| task.name.clone())
				.unwrap_or_else(|| "Unknown task".to_string());
			app.mode = InputMode::Select(build_delete_confirm_select(task_id, name));
			false
		}
		KeyCode::Enter => {
			if app.tab != Tab::Pick {
				return false;
			}
			let PickState::Picked { task_id, .. } = &app.pick else {
				app.status = "Pick a task first".to_string();
				return false;
			};
			app.status = match complete_task(&mut stores.tasks, &mut stores.completions, task_id, local_now()) {
				Ok(task) => format!("Great job! Task completed: {}", task.name),
				Err(err) => report_error(err),
			};
			app.pick = PickState::NotYet;
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode, stores: &mut Stores) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone(), stores) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Pick { energy, time_budget }) => {
					app.pick_energy = energy;
					app.pick_budget = time_budget;
					app.status = roll_pick(app, stores);
				}
				Ok(PromptOutcome::Done(message)) => app.status = message,
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(app: &mut App, code: KeyCode, stores: &mut Stores) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), stores, app.pick_budget) {
				Ok(SelectOutcome::NextPrompt(prompt)) => app.mode = InputMode::Prompt(prompt),
				Ok(SelectOutcome::NextSelect(next_select)) => app.mode = InputMode::Select(next_select),
				Ok(SelectOutcome::Done(message)) => app.status = message,
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(prompt: PromptState, stores: &mut Stores) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::TaskName => {
			let name = required_text(&prompt.input, "task name")?;
			Ok(PromptOutcome::Select(build_task_energy_select(name)))
		}
		PromptKind::TaskDuration {
			name,
			category,
			priority,
		} => {
			let duration = parse_number::<u32>(&prompt.input, "duration")?;
			let task = add_task(&mut stores.tasks, &name, category, priority, duration, local_now())
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!("Task added: {}", task.name)))
		}
		PromptKind::PickTime { energy } => {
			let time_budget = parse_number::<u32>(&prompt.input, "time available")?;
			Ok(PromptOutcome::Pick { energy, time_budget })
		}
		PromptKind::MoodScore => {
			let mood = parse_number::<u8>(&prompt.input, "mood")?;
			if !(MIN_MOOD..=MAX_MOOD).contains(&mood) {
				return Err(format!("mood must be between {MIN_MOOD} and {MAX_MOOD}"));
			}
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				format!("{} Add a note (optional)", mood_emoji(mood)),
				PromptKind::MoodNote { mood },
			)))
		}
		PromptKind::MoodNote { mood } => {
			let entry = log_mood(&mut stores.moods, mood, optional_text(&prompt.input), local_now())
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!(
				"Mood logged: {}/10 {}",
				entry.mood,
				mood_emoji(entry.mood)
			)))
		}
	}
}

fn submit_select(select: SelectState, stores: &mut Stores, pick_budget: u32) -> Result<SelectOutcome, String> {
	let value = select
		.selected_option()
		.map(|option| option.value)
		.ok_or_else(|| "no option selected".to_string())?;

	match (select.kind, value) {
		(SelectKind::TaskEnergy { name }, SelectValue::Energy(category)) => {
			Ok(SelectOutcome::NextSelect(build_task_priority_select(name, category)))
		}
		(SelectKind::TaskPriority { name, category }, SelectValue::Priority(priority)) => {
			Ok(SelectOutcome::NextPrompt(PromptState::with_input(
				"Duration in minutes (5-300)",
				DEFAULT_TASK_DURATION.to_string(),
				PromptKind::TaskDuration {
					name,
					category,
					priority,
				},
			)))
		}
		(SelectKind::PickEnergy, SelectValue::Filter(energy)) => Ok(SelectOutcome::NextPrompt(PromptState::with_input(
			"Time available (min)",
			pick_budget.to_string(),
			PromptKind::PickTime { energy },
		))),
		(SelectKind::DeleteConfirm { task_id, .. }, SelectValue::Confirm(true)) => {
			let task = delete_task(&mut stores.tasks, &task_id).map_err(|err| err.to_string())?;
			Ok(SelectOutcome::Done(format!("Task deleted: {}", task.name)))
		}
		(SelectKind::DeleteConfirm { name, .. }, SelectValue::Confirm(false)) => {
			Ok(SelectOutcome::Done(format!("Kept {name}")))
		}
		_ => Err("unexpected selection".to_string()),
	}
}

fn build_task_energy_select(name: String) -> SelectState {
	let options = EnergyCategory::ALL
		.iter()
		.map(|category| SelectOption::new(category.label(), SelectValue::Energy(*category), Style::default()))
		.collect();
	SelectState::new("Energy level", SelectKind::TaskEnergy { name }, options)
}

fn build_task_priority_select(name: String, category: EnergyCategory) -> SelectState {
	let options = Priority::ALL
		.iter()
		.map(|priority| SelectOption::new(priority.label(), SelectValue::Priority(*priority), priority_style(*priority)))
		.collect();
	SelectState::new("Priority", SelectKind::TaskPriority { name, category }, options)
}

fn build_pick_energy_select(current: EnergyFilter) -> SelectState {
	let options = EnergyFilter::ALL
		.iter()
		.map(|energy| SelectOption::new(energy.label(), SelectValue::Filter(*energy), Style::default()))
		.collect::<Vec<_>>();
	let mut select = SelectState::new("How's your energy level right now?", SelectKind::PickEnergy, options);
	select.selected = EnergyFilter::ALL
		.iter()
		.position(|energy| *energy == current)
		.unwrap_or(0);
	select
}

fn build_delete_confirm_select(task_id: String, name: String) -> SelectState {
	let options = vec![
		SelectOption::new("Keep task", SelectValue::Confirm(false), Style::default()),
		SelectOption::new(
			format!("Delete {name}"),
			SelectValue::Confirm(true),
			Style::default().fg(Color::LightRed),
		),
	];
	SelectState::new("Delete task?", SelectKind::DeleteConfirm { task_id, name }, options)
}

fn roll_pick(app: &mut App, stores: &Stores) -> String {
	app.tab = Tab::Pick;
	let tasks = stores.tasks.tasks();
	let matched = candidates(tasks, app.pick_energy, app.pick_budget).len();
	match pick(tasks, app.pick_energy, app.pick_budget, &mut thread_rng()) {
		PickOutcome::Picked(task) => {
			info!(id = %task.id, name = %task.name, matched, "task picked");
			app.pick = PickState::Picked {
				task_id: task.id.clone(),
				matched,
			};
			format!("Your next task: {}", task.name)
		}
		PickOutcome::NoMatch => {
			app.pick = PickState::NoMatch;
			"No tasks match your current energy level and available time".to_string()
		}
	}
}

fn next_priority_filter(current: &[Priority]) -> Vec<Priority> {
	let index = PRIORITY_FILTERS
		.iter()
		.position(|allowed| *allowed == current)
		.map_or(0, |index| (index + 1) % PRIORITY_FILTERS.len());
	PRIORITY_FILTERS[index].to_vec()
}

fn priority_filter_label(priorities: &[Priority]) -> String {
	if priorities.is_empty() {
		return "All".to_string();
	}
	priorities
		.iter()
		.map(|priority| priority.label())
		.collect::<Vec<_>>()
		.join("+")
}

fn report_error(err: impl std::fmt::Display) -> String {
	warn!(%err, "dashboard action failed");
	format!("error: {err}")
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn parse_number<T: std::str::FromStr>(input: &str, field_name: &str) -> Result<T, String> {
	input
		.trim()
		.parse::<T>()
		.map_err(|_| format!("{field_name} must be a whole number"))
}

fn build_view(app: &App, stores: &Stores, today: NaiveDate) -> ViewModel {
	let tasks = stores.tasks.tasks();
	let moods = stores.moods.entries();
	let events = stores.completions.events();

	let filter = TaskFilter {
		priorities: app.task_priorities.clone(),
		energy: app.task_filter,
	};
	let task_rows = stores
		.tasks
		.filter(&filter)
		.into_iter()
		.map(|task| TaskRow {
			task_id: task.id.clone(),
			line: task_line(task),
		})
		.collect();

	let counts = daily_counts(events);
	let daily = (0..COMPLETION_DAYS_SHOWN)
		.rev()
		.map(|days_ago| {
			let day = today - Duration::days(days_ago);
			(day, counts.get(&day).copied().unwrap_or(0))
		})
		.collect();

	let picked = match &app.pick {
		PickState::Picked { task_id, .. } => stores.tasks.get(task_id).cloned(),
		PickState::NotYet | PickState::NoMatch => None,
	};

	ViewModel {
		metrics: DashboardMetrics::compute(tasks, moods, events, today),
		streak: streak(events, today),
		task_rows,
		task_total: tasks.len(),
		priority_counts: priority_distribution(tasks),
		energy_counts: energy_distribution(tasks),
		daily,
		moods: recent_moods(moods, MOOD_HISTORY_SHOWN).to_vec(),
		picked,
		pick_candidates: candidates(tasks, app.pick_energy, app.pick_budget).len(),
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
	Pick { energy: EnergyFilter, time_budget: u32 },
	Done(String),
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	NextPrompt(PromptState),
	NextSelect(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self::with_input(title, String::new(), kind)
	}

	fn with_input(title: impl Into<String>, input: String, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input,
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: SelectValue,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: SelectValue, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectValue {
	Energy(EnergyCategory),
	Priority(Priority),
	Filter(EnergyFilter),
	Confirm(bool),
}

#[derive(Debug, Clone)]
enum PromptKind {
	TaskName,
	TaskDuration {
		name: String,
		category: EnergyCategory,
		priority: Priority,
	},
	PickTime {
		energy: EnergyFilter,
	},
	MoodScore,
	MoodNote {
		mood: u8,
	},
}

#[derive(Debug, Clone)]
enum SelectKind {
	TaskEnergy {
		name: String,
	},
	TaskPriority {
		name: String,
		category: EnergyCategory,
	},
	PickEnergy,
	DeleteConfirm {
		task_id: String,
		name: String,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
	Dashboard,
	Tasks,
	Pick,
	Mood,
	Analytics,
}

impl Tab {
	const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Tasks, Tab::Pick, Tab::Mood, Tab::Analytics];

	fn index(self) -> usize {
		Tab::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
	}

	fn next(self) -> Self {
		Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
	}

	fn prev(self) -> Self {
		Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
	}

	fn title(self) -> &'static str {
		match self {
			Tab::Dashboard => "Dashboard",
			Tab::Tasks => "Tasks",
			Tab::Pick => "Pick Task",
			Tab::Mood => "Mood Tracker",
			Tab::Analytics => "Analytics",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PickState {
	NotYet,
	Picked { task_id: String, matched: usize },
	NoMatch,
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	tab: Tab,
	task_index: usize,
	task_filter: EnergyFilter,
	task_priorities: Vec<Priority>,
	pick_energy: EnergyFilter,
	pick_budget: u32,
	pick: PickState,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(config: &Config) -> Self {
		Self {
			tab: Tab::Dashboard,
			task_index: 0,
			task_filter: EnergyFilter::Any,
			task_priorities: Vec::new(),
			pick_energy: config.default_energy,
			pick_budget: config.default_time_budget,
			pick: PickState::NotYet,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		if view.task_rows.is_empty() {
			self.task_index = 0;
		} else {
			self.task_index = self.task_index.min(view.task_rows.len() - 1);
		}
	}

	fn move_task_selection(&mut self, delta: i32, view: &ViewModel) {
		if view.task_rows.is_empty() {
			self.task_index = 0;
			return;
		}

		if delta > 0 {
			self.task_index = (self.task_index + delta as usize).min(view.task_rows.len() - 1);
		} else {
			self.task_index = self.task_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_task_id(&self, view: &ViewModel) -> Option<String> {
		if self.tab != Tab::Tasks {
			return None;
		}
		view.task_rows.get(self.task_index).map(|row| row.task_id.clone())
	}
}

struct ViewModel {
	metrics: DashboardMetrics,
	streak: StreakSummary,
	task_rows: Vec<TaskRow>,
	task_total: usize,
	priority_counts: Vec<(Priority, usize)>,
	energy_counts: Vec<(EnergyCategory, usize)>,
	daily: Vec<(NaiveDate, usize)>,
	moods: Vec<MoodEntry>,
	picked: Option<Task>,
	pick_candidates: usize,
}

#[derive(Clone)]
struct TaskRow {
	task_id: String,
	line: Line<'static>,
}
