use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::warn;

use crate::domain::{EnergyFilter, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome<'a> {
    Picked(&'a Task),
    NoMatch,
}

/// Tasks that fit the current energy level and time budget, in store order.
pub fn candidates(tasks: &[Task], energy: EnergyFilter, time_budget: u32) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| energy.matches(task.category) && task.duration <= time_budget)
        .collect()
}

/// Draws one candidate with probability proportional to its priority weight.
pub fn pick<'a, R>(
    tasks: &'a [Task],
    energy: EnergyFilter,
    time_budget: u32,
    rng: &mut R,
) -> PickOutcome<'a>
where
    R: Rng + ?Sized,
{
    let candidates = candidates(tasks, energy, time_budget);
    if candidates.is_empty() {
        return PickOutcome::NoMatch;
    }

    let weights = candidates.iter().map(|task| task.priority.weight());
    match WeightedIndex::new(weights) {
        Ok(distribution) => PickOutcome::Picked(candidates[distribution.sample(rng)]),
        Err(err) => {
            warn!(%err, candidates = candidates.len(), "could not weight candidates");
            PickOutcome::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::domain::{EnergyCategory, EnergyFilter, Priority, Task};

    use super::{PickOutcome, candidates, pick};

    #[test]
    fn every_priority_has_a_positive_weight() {
        let weights = Priority::ALL.map(Priority::weight);
        assert_eq!(weights, [5, 3, 1]);
        assert!(weights.iter().all(|weight| *weight > 0));
    }

    fn task(name: &str, priority: Priority, duration: u32, category: EnergyCategory) -> Task {
        let created = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Task::new(name, category, priority, duration, created).expect("valid task")
    }

    #[test]
    fn picks_the_only_task_within_budget() {
        let tasks = vec![
            task("A", Priority::High, 30, EnergyCategory::LowEnergy),
            task("B", Priority::Low, 20, EnergyCategory::LowEnergy),
        ];

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            match pick(&tasks, EnergyFilter::LowEnergy, 25, &mut rng) {
                PickOutcome::Picked(chosen) => assert_eq!(chosen.name, "B"),
                PickOutcome::NoMatch => panic!("B fits the budget"),
            }
        }
    }

    #[test]
    fn reports_no_match_only_when_nothing_fits() {
        let tasks = vec![
            task("Deep work", Priority::High, 120, EnergyCategory::HighEnergy),
            task("Inbox", Priority::Medium, 15, EnergyCategory::LowEnergy),
        ];
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(pick(&[], EnergyFilter::Any, 300, &mut rng), PickOutcome::NoMatch);
        assert_eq!(pick(&tasks, EnergyFilter::Any, 10, &mut rng), PickOutcome::NoMatch);
        assert_eq!(
            pick(&tasks, EnergyFilter::HighEnergy, 60, &mut rng),
            PickOutcome::NoMatch
        );
        assert!(matches!(
            pick(&tasks, EnergyFilter::HighEnergy, 120, &mut rng),
            PickOutcome::Picked(chosen) if chosen.name == "Deep work"
        ));
        assert_eq!(candidates(&tasks, EnergyFilter::Any, 300).len(), 2);
    }

    #[test]
    fn never_returns_tasks_outside_the_constraints() {
        let tasks = vec![
            task("Walk", Priority::Low, 20, EnergyCategory::LowEnergy),
            task("Run", Priority::High, 45, EnergyCategory::HighEnergy),
            task("Read", Priority::Medium, 60, EnergyCategory::LowEnergy),
            task("Code", Priority::High, 90, EnergyCategory::HighEnergy),
            task("Email", Priority::Medium, 10, EnergyCategory::LowEnergy),
        ];
        let mut rng = StdRng::seed_from_u64(42);

        for filter in EnergyFilter::ALL {
            for budget in [5, 15, 30, 60, 120] {
                for _ in 0..25 {
                    if let PickOutcome::Picked(chosen) = pick(&tasks, filter, budget, &mut rng) {
                        assert!(chosen.duration <= budget);
                        assert!(filter.matches(chosen.category));
                    }
                }
            }
        }
    }

    #[test]
    fn favours_higher_priorities_in_proportion_to_weight() {
        let tasks = vec![
            task("high", Priority::High, 30, EnergyCategory::LowEnergy),
            task("medium", Priority::Medium, 30, EnergyCategory::LowEnergy),
            task("low", Priority::Low, 30, EnergyCategory::LowEnergy),
        ];
        let mut rng = StdRng::seed_from_u64(2026);
        let trials = 90_000;
        let mut counts: HashMap<String, usize> = HashMap::new();

        for _ in 0..trials {
            if let PickOutcome::Picked(chosen) = pick(&tasks, EnergyFilter::Any, 60, &mut rng) {
                *counts.entry(chosen.name.clone()).or_default() += 1;
            }
        }

        let share = |name: &str| counts.get(name).copied().unwrap_or(0) as f64 / trials as f64;
        assert!((share("high") - 5.0 / 9.0).abs() < 0.02, "high share {}", share("high"));
        assert!((share("medium") - 3.0 / 9.0).abs() < 0.02, "medium share {}", share("medium"));
        assert!((share("low") - 1.0 / 9.0).abs() < 0.02, "low share {}", share("low"));
    }
}
