pub mod dates;
pub mod grid;
pub mod stats;

use crate::db::CompletionLog;
use chrono::NaiveDate;
use std::collections::HashMap;

pub(crate) fn index_logs(logs: &[CompletionLog]) -> HashMap<(i64, NaiveDate), &CompletionLog> {
    logs.iter().map(|log| ((log.habit_id, log.date), log)).collect()
}
