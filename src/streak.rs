use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::CompletionEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakSummary {
    /// Consecutive days with a completion, ending today.
    pub current_streak: u32,
    /// Most completions on a single day; zero with no history.
    pub best_day_count: usize,
    pub total_completed: usize,
}

pub fn streak(events: &[CompletionEvent], today: NaiveDate) -> StreakSummary {
    let counts = daily_counts(events);

    let mut current_streak = 0;
    let mut day = today;
    while counts.contains_key(&day) {
        current_streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }

    StreakSummary {
        current_streak,
        best_day_count: counts.values().copied().max().unwrap_or(0),
        total_completed: events.len(),
    }
}

/// Completions per local calendar day, oldest first.
pub fn daily_counts(events: &[CompletionEvent]) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.date.date()).or_insert(0) += 1;
    }
    counts
}

pub fn completed_on(events: &[CompletionEvent], day: NaiveDate) -> usize {
    events
        .iter()
        .filter(|event| event.date.date() == day)
        .count()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::domain::CompletionEvent;

    use super::{StreakSummary, completed_on, daily_counts, streak};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    fn done(days_ago: i64, hour: u32) -> CompletionEvent {
        let day = today() - Duration::days(days_ago);
        CompletionEvent::new(
            format!("task-{days_ago}-{hour}"),
            day.and_hms_opt(hour, 15, 0).unwrap(),
        )
    }

    #[test]
    fn empty_history_is_all_zero() {
        assert_eq!(streak(&[], today()), StreakSummary::default());
    }

    #[test]
    fn counts_consecutive_days_ending_today() {
        let events = vec![done(2, 9), done(1, 22), done(0, 0)];
        assert_eq!(streak(&events, today()).current_streak, 3);
    }

    #[test]
    fn stops_at_the_first_gap() {
        let events = vec![done(2, 9), done(0, 10)];
        let summary = streak(&events, today());
        assert_eq!(summary.current_streak, 1);
        assert_eq!(summary.total_completed, 2);
    }

    #[test]
    fn is_zero_when_nothing_was_done_today() {
        let events = vec![done(3, 9), done(2, 9), done(1, 9)];
        assert_eq!(streak(&events, today()).current_streak, 0);
    }

    #[test]
    fn best_day_and_total_count_every_event() {
        let events = vec![done(1, 8), done(0, 8), done(0, 12), done(0, 19), done(5, 7)];
        let summary = streak(&events, today());
        assert_eq!(summary.best_day_count, 3);
        assert_eq!(summary.total_completed, 5);
        assert_eq!(summary.current_streak, 2);
    }

    #[test]
    fn ignores_input_order() {
        let events = vec![done(0, 8), done(4, 8), done(1, 8), done(2, 8), done(1, 20)];
        let expected = streak(&events, today());

        let mut reversed = events.clone();
        reversed.reverse();
        assert_eq!(streak(&reversed, today()), expected);

        let mut rotated = events.clone();
        rotated.rotate_left(2);
        assert_eq!(streak(&rotated, today()), expected);
        assert_eq!(expected.current_streak, 3);
    }

    #[test]
    fn groups_by_calendar_day() {
        let events = vec![done(0, 23), done(0, 1), done(1, 12)];
        let counts = daily_counts(&events);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.get(&today()), Some(&2));
        assert_eq!(completed_on(&events, today()), 2);
        assert_eq!(completed_on(&events, today() - Duration::days(7)), 0);
    }
}
