use crate::db::{CompletionLog, Habit};
use crate::engine::dates::day_range;
use crate::engine::index_logs;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HabitStats {
    pub habit: Habit,
    pub completed: u32,
    pub possible: u32,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_completed: u32,
    pub total_possible: u32,
    pub overall_rate: f64,
    pub habit_stats: Vec<HabitStats>,
    pub most_consistent: Option<HabitStats>,
    pub least_consistent: Option<HabitStats>,
}

pub fn compute_statistics(
    habits: &[Habit],
    logs: &[CompletionLog],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Statistics> {
    if start > end {
        bail!("Invalid statistics range: start {start} is after end {end}");
    }

    let log_index = index_logs(logs);

    let mut habit_stats = Vec::with_capacity(habits.len());
    let mut total_completed = 0u32;
    let mut total_possible = 0u32;

    for habit in habits {
        let mut completed = 0u32;
        let mut possible = 0u32;

        // Days before the habit existed are not possible days.
        for date in day_range(habit.created_on.max(start), end) {
            possible += 1;

            if let Some(log) = log_index.get(&(habit.id, date)) {
                if log.completed {
                    completed += 1;
                }
            }
        }

        let rate = if possible > 0 {
            f64::from(completed) / f64::from(possible) * 100.0
        } else {
            0.0
        };

        total_completed += completed;
        total_possible += possible;

        habit_stats.push(HabitStats {
            habit: habit.clone(),
            completed,
            possible,
            rate,
        });
    }

    // Stable sort: habits tied on rate keep their display order.
    habit_stats.sort_by(|left, right| right.rate.total_cmp(&left.rate));

    let overall_rate = if total_possible > 0 {
        f64::from(total_completed) / f64::from(total_possible) * 100.0
    } else {
        0.0
    };

    Ok(Statistics {
        total_completed,
        total_possible,
        overall_rate,
        most_consistent: habit_stats.first().cloned(),
        least_consistent: habit_stats.last().cloned(),
        habit_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::compute_statistics;
    use crate::db::{CompletionLog, Habit};
    use chrono::{Datelike, NaiveDate};

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn habit(id: i64, order_index: i64, created_on: NaiveDate) -> Habit {
        Habit {
            id,
            name: format!("habit-{id}"),
            description: String::new(),
            is_active: true,
            created_at: 0,
            created_on,
            order_index,
        }
    }

    fn completed_log(habit_id: i64, date: NaiveDate) -> CompletionLog {
        CompletionLog {
            id: habit_id * 1000 + i64::from(date.ordinal()),
            habit_id,
            date,
            completed: true,
            completed_at: Some(0),
        }
    }

    #[test]
    fn empty_logs_yield_zero_rates() {
        let habits = vec![habit(1, 0, day(2024, 1, 1)), habit(2, 1, day(2024, 1, 1))];

        let stats =
            compute_statistics(&habits, &[], day(2024, 1, 1), day(2024, 1, 7)).expect("stats");

        assert_eq!(stats.overall_rate, 0.0);
        assert!(stats.habit_stats.iter().all(|entry| entry.rate == 0.0));
        assert_eq!(stats.total_possible, 14);
        assert_eq!(stats.total_completed, 0);
    }

    #[test]
    fn no_habits_is_a_valid_zero_state() {
        let stats = compute_statistics(&[], &[], day(2024, 1, 1), day(2024, 1, 7)).expect("stats");

        assert_eq!(stats.total_possible, 0);
        assert_eq!(stats.overall_rate, 0.0);
        assert!(stats.habit_stats.is_empty());
        assert!(stats.most_consistent.is_none());
        assert!(stats.least_consistent.is_none());
    }

    #[test]
    fn two_of_three_days_completed() {
        let habits = vec![habit(1, 0, day(2024, 1, 1))];
        let logs = vec![
            completed_log(1, day(2024, 1, 1)),
            completed_log(1, day(2024, 1, 3)),
        ];

        let stats =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 3)).expect("stats");

        let entry = &stats.habit_stats[0];
        assert_eq!(entry.possible, 3);
        assert_eq!(entry.completed, 2);
        assert!((entry.rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn uncompleted_log_does_not_count() {
        let habits = vec![habit(1, 0, day(2024, 1, 1))];
        let logs = vec![CompletionLog {
            id: 1,
            habit_id: 1,
            date: day(2024, 1, 2),
            completed: false,
            completed_at: None,
        }];

        let stats =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 3)).expect("stats");

        assert_eq!(stats.habit_stats[0].completed, 0);
    }

    #[test]
    fn creation_day_itself_counts_as_possible() {
        let habits = vec![habit(1, 0, day(2024, 1, 7))];

        let stats =
            compute_statistics(&habits, &[], day(2024, 1, 1), day(2024, 1, 7)).expect("stats");

        assert_eq!(stats.habit_stats[0].possible, 1);
    }

    #[test]
    fn habit_created_after_range_is_still_ranked() {
        let habits = vec![habit(1, 0, day(2024, 1, 1)), habit(2, 1, day(2024, 2, 1))];
        let logs = vec![completed_log(1, day(2024, 1, 2))];

        let stats =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 7)).expect("stats");

        assert_eq!(stats.habit_stats.len(), 2);

        let late = stats
            .habit_stats
            .iter()
            .find(|entry| entry.habit.id == 2)
            .expect("late habit present");
        assert_eq!(late.possible, 0);
        assert_eq!(late.rate, 0.0);

        let least = stats.least_consistent.as_ref().expect("least");
        assert_eq!(least.habit.id, 2);
    }

    #[test]
    fn ranking_is_descending_by_rate() {
        let habits = vec![habit(1, 0, day(2024, 1, 1)), habit(2, 1, day(2024, 1, 1))];
        let logs = vec![
            completed_log(2, day(2024, 1, 1)),
            completed_log(2, day(2024, 1, 2)),
            completed_log(1, day(2024, 1, 1)),
        ];

        let stats =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 2)).expect("stats");

        assert_eq!(stats.habit_stats[0].habit.id, 2);
        assert_eq!(stats.habit_stats[1].habit.id, 1);
        assert_eq!(stats.most_consistent.as_ref().expect("most").habit.id, 2);
        assert_eq!(stats.least_consistent.as_ref().expect("least").habit.id, 1);
    }

    #[test]
    fn tied_rates_keep_display_order() {
        let habits = vec![habit(7, 0, day(2024, 1, 1)), habit(3, 1, day(2024, 1, 1))];
        let logs = vec![
            completed_log(7, day(2024, 1, 1)),
            completed_log(3, day(2024, 1, 1)),
        ];

        let stats =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 2)).expect("stats");

        assert_eq!(stats.habit_stats[0].habit.id, 7);
        assert_eq!(stats.habit_stats[1].habit.id, 3);
    }

    #[test]
    fn single_habit_is_both_most_and_least_consistent() {
        let habits = vec![habit(1, 0, day(2024, 1, 1))];
        let logs = vec![completed_log(1, day(2024, 1, 1))];

        let stats =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 2)).expect("stats");

        assert_eq!(stats.most_consistent.as_ref().expect("most").habit.id, 1);
        assert_eq!(stats.least_consistent.as_ref().expect("least").habit.id, 1);
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let habits = vec![habit(1, 0, day(2024, 1, 1)), habit(2, 1, day(2024, 1, 3))];
        let logs = vec![
            completed_log(1, day(2024, 1, 2)),
            completed_log(2, day(2024, 1, 4)),
        ];

        let first =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 5)).expect("stats");
        let second =
            compute_statistics(&habits, &logs, day(2024, 1, 1), day(2024, 1, 5)).expect("stats");

        assert_eq!(first.total_completed, second.total_completed);
        assert_eq!(first.total_possible, second.total_possible);
        assert_eq!(first.overall_rate, second.overall_rate);
        assert_eq!(
            first
                .habit_stats
                .iter()
                .map(|entry| (entry.habit.id, entry.completed, entry.possible))
                .collect::<Vec<_>>(),
            second
                .habit_stats
                .iter()
                .map(|entry| (entry.habit.id, entry.completed, entry.possible))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let habits = vec![habit(1, 0, day(2024, 1, 1))];
        assert!(compute_statistics(&habits, &[], day(2024, 1, 5), day(2024, 1, 4)).is_err());
    }
}
