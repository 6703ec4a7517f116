pub const CREATE_HABITS: &str = r#"
CREATE TABLE IF NOT EXISTS habits (
  id          INTEGER PRIMARY KEY AUTOINCREMENT,
  name        TEXT NOT NULL,
  description TEXT NOT NULL DEFAULT '',
  is_active   INTEGER NOT NULL DEFAULT 1,
  created_at  INTEGER NOT NULL,
  created_on  TEXT NOT NULL,
  order_index INTEGER NOT NULL
);
"#;

pub const CREATE_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
  id           INTEGER PRIMARY KEY AUTOINCREMENT,
  habit_id     INTEGER NOT NULL,
  date         TEXT NOT NULL,
  completed    INTEGER NOT NULL DEFAULT 0,
  completed_at INTEGER
);
"#;

pub const INDEX_LOGS_HABIT_DATE: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_logs_habit_date ON logs(habit_id, date);";

pub const INDEX_LOGS_DATE: &str = "CREATE INDEX IF NOT EXISTS idx_logs_date ON logs(date);";

pub const INDEX_HABITS_ORDER: &str =
    "CREATE INDEX IF NOT EXISTS idx_habits_order ON habits(order_index);";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_HABITS,
        CREATE_LOGS,
        INDEX_LOGS_HABIT_DATE,
        INDEX_LOGS_DATE,
        INDEX_HABITS_ORDER,
    ]
}
