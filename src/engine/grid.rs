use crate::db::{CompletionLog, Habit};
use crate::engine::dates::local_today;
use crate::engine::index_logs;
use anyhow::{Result, bail};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Inapplicable,
    Completed,
    Pending,
    Missed,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub state: CellState,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitRow {
    pub habit: Habit,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryGrid {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<HabitRow>,
}

pub fn build_history_grid(
    habits: &[Habit],
    logs: &[CompletionLog],
    window_days: u32,
) -> Result<HistoryGrid> {
    build_history_grid_at(local_today(), habits, logs, window_days)
}

pub fn build_history_grid_at(
    anchor: NaiveDate,
    habits: &[Habit],
    logs: &[CompletionLog],
    window_days: u32,
) -> Result<HistoryGrid> {
    if window_days == 0 {
        bail!("History window must cover at least one day");
    }

    // Most recent day first; consumers rely on this ordering.
    let dates = (0..window_days)
        .map(|offset| anchor - Duration::days(i64::from(offset)))
        .collect::<Vec<_>>();

    let log_index = index_logs(logs);

    let rows = habits
        .iter()
        .map(|habit| {
            let cells = dates
                .iter()
                .map(|&date| {
                    let state = if date < habit.created_on {
                        CellState::Inapplicable
                    } else if log_index
                        .get(&(habit.id, date))
                        .is_some_and(|log| log.completed)
                    {
                        CellState::Completed
                    } else if date == anchor {
                        CellState::Pending
                    } else {
                        CellState::Missed
                    };

                    GridCell { date, state }
                })
                .collect();

            HabitRow {
                habit: habit.clone(),
                cells,
            }
        })
        .collect();

    Ok(HistoryGrid { dates, rows })
}

#[cfg(test)]
mod tests {
    use super::{CellState, build_history_grid_at};
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
    fn dates_are_descending_from_anchor() {
        let grid =
            build_history_grid_at(day(2024, 1, 10), &[], &[], 3).expect("grid");

        assert_eq!(
            grid.dates,
            vec![day(2024, 1, 10), day(2024, 1, 9), day(2024, 1, 8)]
        );
    }

    #[test]
    fn cells_align_with_dates_per_habit() {
        let habits = vec![habit(1, 0, day(2024, 1, 1))];
        let grid = build_history_grid_at(day(2024, 1, 10), &habits, &[], 5).expect("grid");

        assert_eq!(grid.rows.len(), 1);
        let row = &grid.rows[0];
        assert_eq!(row.cells.len(), 5);

        for (cell, date) in row.cells.iter().zip(&grid.dates) {
            assert_eq!(cell.date, *date);
        }
    }

    #[test]
    fn cell_states_cover_the_window() {
        let habits = vec![habit(1, 0, day(2024, 1, 9))];
        let logs = vec![completed_log(1, day(2024, 1, 9))];

        let grid = build_history_grid_at(day(2024, 1, 10), &habits, &logs, 3).expect("grid");
        let cells = &grid.rows[0].cells;

        assert_eq!(cells[0].state, CellState::Pending);
        assert_eq!(cells[1].state, CellState::Completed);
        assert_eq!(cells[2].state, CellState::Inapplicable);
    }

    #[test]
    fn applicable_day_without_log_is_missed() {
        let habits = vec![habit(1, 0, day(2024, 1, 1))];

        let grid = build_history_grid_at(day(2024, 1, 10), &habits, &[], 2).expect("grid");
        let cells = &grid.rows[0].cells;

        assert_eq!(cells[0].state, CellState::Pending);
        assert_eq!(cells[1].state, CellState::Missed);
    }

    #[test]
    fn log_before_creation_day_stays_inapplicable() {
        let habits = vec![habit(1, 0, day(2024, 1, 5))];
        let logs = vec![completed_log(1, day(2024, 1, 4))];

        let grid = build_history_grid_at(day(2024, 1, 5), &habits, &logs, 2).expect("grid");
        let cells = &grid.rows[0].cells;

        assert_eq!(cells[1].date, day(2024, 1, 4));
        assert_eq!(cells[1].state, CellState::Inapplicable);
    }

    #[test]
    fn rows_keep_display_order() {
        let habits = vec![habit(9, 0, day(2024, 1, 1)), habit(2, 1, day(2024, 1, 1))];

        let grid = build_history_grid_at(day(2024, 1, 10), &habits, &[], 1).expect("grid");

        assert_eq!(grid.rows[0].habit.id, 9);
        assert_eq!(grid.rows[1].habit.id, 2);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(build_history_grid_at(day(2024, 1, 10), &[], &[], 0).is_err());
    }
}
