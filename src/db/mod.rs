pub mod queries;

use crate::engine::dates::local_day;
use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: i64,
    pub created_on: NaiveDate,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionLog {
    pub id: i64,
    pub habit_id: i64,
    pub date: NaiveDate,
    pub completed: bool,
    pub completed_at: Option<i64>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn all_habits(&self) -> Result<Vec<Habit>> {
        let mut statement = self.conn.prepare(
            "SELECT id, name, description, is_active, created_at, created_on, order_index
             FROM habits
             ORDER BY order_index ASC",
        )?;

        let rows = statement
            .query_map([], |row| {
                Ok(Habit {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    is_active: row.get(3)?,
                    created_at: row.get(4)?,
                    created_on: row.get(5)?,
                    order_index: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query habits")?;

        Ok(rows)
    }

    pub fn active_habits(&self) -> Result<Vec<Habit>> {
        let habits = self.all_habits()?;
        Ok(habits.into_iter().filter(|habit| habit.is_active).collect())
    }

    pub fn habit(&self, id: i64) -> Result<Option<Habit>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, description, is_active, created_at, created_on, order_index
                 FROM habits
                 WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Habit {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        is_active: row.get(3)?,
                        created_at: row.get(4)?,
                        created_on: row.get(5)?,
                        order_index: row.get(6)?,
                    })
                },
            )
            .ok();

        Ok(row)
    }

    pub fn create_habit(&self, name: &str, description: &str) -> Result<Habit> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Habit name must not be empty");
        }
        let description = description.trim();

        let max_order: Option<i64> = self
            .conn
            .query_row("SELECT MAX(order_index) FROM habits", [], |row| row.get(0))
            .context("Failed to read habit order")?;
        let order_index = max_order.map_or(0, |value| value + 1);

        let created_at = Utc::now().timestamp();
        let created_on = local_day(created_at)?;

        self.conn
            .execute(
                "INSERT INTO habits (name, description, is_active, created_at, created_on, order_index)
                 VALUES (?1, ?2, 1, ?3, ?4, ?5)",
                params![name, description, created_at, created_on, order_index],
            )
            .context("Failed to insert habit")?;

        Ok(Habit {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            is_active: true,
            created_at,
            created_on,
            order_index,
        })
    }

    pub fn update_habit(&self, habit: &Habit) -> Result<()> {
        let name = habit.name.trim();
        if name.is_empty() {
            bail!("Habit name must not be empty");
        }

        let updated = self
            .conn
            .execute(
                "UPDATE habits SET name = ?1, description = ?2, is_active = ?3 WHERE id = ?4",
                params![name, habit.description.trim(), habit.is_active, habit.id],
            )
            .context("Failed to update habit")?;

        if updated == 0 {
            bail!("No habit with id {}", habit.id);
        }

        Ok(())
    }

    pub fn delete_habit(&mut self, id: i64) -> Result<usize> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        let removed_logs = transaction
            .execute("DELETE FROM logs WHERE habit_id = ?1", params![id])
            .context("Failed to delete habit logs")?;

        let deleted = transaction
            .execute("DELETE FROM habits WHERE id = ?1", params![id])
            .context("Failed to delete habit")?;

        if deleted == 0 {
            bail!("No habit with id {id}");
        }

        transaction.commit().context("Failed to commit delete")?;
        Ok(removed_logs)
    }

    pub fn reorder_habits(&mut self, ordered_ids: &[i64]) -> Result<()> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        for (position, id) in ordered_ids.iter().enumerate() {
            let updated = transaction
                .execute(
                    "UPDATE habits SET order_index = ?1 WHERE id = ?2",
                    params![position as i64, id],
                )
                .context("Failed to update habit order")?;

            if updated == 0 {
                bail!("No habit with id {id}");
            }
        }

        transaction.commit().context("Failed to commit reorder")?;
        Ok(())
    }

    pub fn count_logs_for_habit(&self, habit_id: i64) -> Result<u32> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM logs WHERE habit_id = ?1",
                params![habit_id],
                |row| row.get(0),
            )
            .context("Failed to count habit logs")
    }

    pub fn log_for(&self, habit_id: i64, date: NaiveDate) -> Result<Option<CompletionLog>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, habit_id, date, completed, completed_at
                 FROM logs
                 WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, date],
                |row| {
                    Ok(CompletionLog {
                        id: row.get(0)?,
                        habit_id: row.get(1)?,
                        date: row.get(2)?,
                        completed: row.get(3)?,
                        completed_at: row.get(4)?,
                    })
                },
            )
            .ok();

        Ok(row)
    }

    pub fn logs_for_habit(&self, habit_id: i64) -> Result<Vec<CompletionLog>> {
        let mut statement = self.conn.prepare(
            "SELECT id, habit_id, date, completed, completed_at
             FROM logs
             WHERE habit_id = ?1
             ORDER BY date ASC",
        )?;

        let rows = statement
            .query_map(params![habit_id], |row| {
                Ok(CompletionLog {
                    id: row.get(0)?,
                    habit_id: row.get(1)?,
                    date: row.get(2)?,
                    completed: row.get(3)?,
                    completed_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query habit logs")?;

        Ok(rows)
    }

    pub fn logs_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CompletionLog>> {
        let mut statement = self.conn.prepare(
            "SELECT id, habit_id, date, completed, completed_at
             FROM logs
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC",
        )?;

        let rows = statement
            .query_map(params![start, end], |row| {
                Ok(CompletionLog {
                    id: row.get(0)?,
                    habit_id: row.get(1)?,
                    date: row.get(2)?,
                    completed: row.get(3)?,
                    completed_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query logs in range")?;

        Ok(rows)
    }

    pub fn toggle_completion(&self, habit_id: i64, date: NaiveDate) -> Result<CompletionLog> {
        let habit_exists: bool = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM habits WHERE id = ?1)",
                params![habit_id],
                |row| row.get(0),
            )
            .context("Failed to look up habit")?;

        if !habit_exists {
            bail!("No habit with id {habit_id}");
        }

        match self.log_for(habit_id, date)? {
            Some(mut log) => {
                log.completed = !log.completed;
                log.completed_at = log.completed.then(|| Utc::now().timestamp());

                self.conn
                    .execute(
                        "UPDATE logs SET completed = ?1, completed_at = ?2 WHERE id = ?3",
                        params![log.completed, log.completed_at, log.id],
                    )
                    .context("Failed to update completion log")?;

                Ok(log)
            }
            None => {
                let completed_at = Utc::now().timestamp();

                self.conn
                    .execute(
                        "INSERT INTO logs (habit_id, date, completed, completed_at)
                         VALUES (?1, ?2, 1, ?3)",
                        params![habit_id, date, completed_at],
                    )
                    .context("Failed to insert completion log")?;

                Ok(CompletionLog {
                    id: self.conn.last_insert_rowid(),
                    habit_id,
                    date,
                    completed: true,
                    completed_at: Some(completed_at),
                })
            }
        }
    }

    pub fn is_completed(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        let log = self.log_for(habit_id, date)?;
        Ok(log.map(|entry| entry.completed).unwrap_or(false))
    }

    pub fn count_logs(&self) -> Result<u32> {
        self.conn
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))
            .context("Failed to count logs")
    }

    pub fn latest_completion_timestamp(&self) -> Result<Option<i64>> {
        let timestamp = self
            .conn
            .query_row(
                "SELECT completed_at FROM logs WHERE completed = 1 ORDER BY completed_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();

        Ok(timestamp)
    }
}
