use crate::config::Config;
use crate::db::{CompletionLog, Database, Habit};
use crate::engine::dates::local_today;
use crate::engine::grid::{HistoryGrid, build_history_grid};
use crate::engine::stats::{Statistics, compute_statistics};
use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/habits", get(habit_list).post(habit_create))
        .route("/api/v1/habits/order", put(habit_reorder))
        .route("/api/v1/habits/:id", put(habit_update).delete(habit_delete))
        .route("/api/v1/habits/:id/logs", get(habit_logs))
        .route("/api/v1/today", get(today))
        .route("/api/v1/logs/toggle", post(log_toggle))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/history", get(history))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreateHabitPayload {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct UpdateHabitPayload {
    name: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ReorderPayload {
    ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct TogglePayload {
    habit_id: i64,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    days: Option<u32>,
    from: Option<String>,
    to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct HabitsPayload {
    count: usize,
    habits: Vec<Habit>,
}

#[derive(Debug, Serialize)]
struct HabitLogsPayload {
    habit_id: i64,
    count: usize,
    logs: Vec<CompletionLog>,
}

#[derive(Debug, Serialize)]
struct TodayEntry {
    habit: Habit,
    completed: bool,
}

#[derive(Debug, Serialize)]
struct TodayPayload {
    date: NaiveDate,
    habits: Vec<TodayEntry>,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    habit_count: usize,
    active_habit_count: usize,
    log_count: u32,
    last_completed_at: Option<i64>,
    db_path: String,
    api_port: u16,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let database = Database::open(&state.config.db_path)?;
    let habits = database.all_habits()?;
    let active_habit_count = habits.iter().filter(|habit| habit.is_active).count();

    let payload = StatusPayload {
        habit_count: habits.len(),
        active_habit_count,
        log_count: database.count_logs()?,
        last_completed_at: database.latest_completion_timestamp()?,
        db_path: state.config.db_path.display().to_string(),
        api_port: state.config.api_port,
    };

    Ok(Json(payload))
}

async fn habit_list(State(state): State<ApiState>) -> ApiResult<Json<HabitsPayload>> {
    let database = Database::open(&state.config.db_path)?;
    let habits = database.all_habits()?;

    Ok(Json(HabitsPayload {
        count: habits.len(),
        habits,
    }))
}

async fn habit_create(
    State(state): State<ApiState>,
    Json(payload): Json<CreateHabitPayload>,
) -> ApiResult<Json<Habit>> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Habit name must not be empty".to_string()));
    }

    let database = Database::open(&state.config.db_path)?;
    let habit = database.create_habit(&payload.name, &payload.description)?;

    Ok(Json(habit))
}

async fn habit_update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateHabitPayload>,
) -> ApiResult<Json<Habit>> {
    let database = Database::open(&state.config.db_path)?;
    let mut habit = database
        .habit(id)?
        .ok_or_else(|| ApiError::NotFound(format!("No habit with id {id}")))?;

    if let Some(name) = payload.name {
        habit.name = name;
    }
    if let Some(description) = payload.description {
        habit.description = description;
    }
    if let Some(is_active) = payload.is_active {
        habit.is_active = is_active;
    }

    database
        .update_habit(&habit)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    let habit = database
        .habit(id)?
        .ok_or_else(|| ApiError::NotFound(format!("No habit with id {id}")))?;

    Ok(Json(habit))
}

async fn habit_delete(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let mut database = Database::open(&state.config.db_path)?;
    database
        .habit(id)?
        .ok_or_else(|| ApiError::NotFound(format!("No habit with id {id}")))?;

    let removed_logs = database.delete_habit(id)?;

    Ok(Json(json!({
        "deleted": true,
        "logs_removed": removed_logs
    })))
}

async fn habit_logs(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<HabitLogsPayload>> {
    let database = Database::open(&state.config.db_path)?;
    database
        .habit(id)?
        .ok_or_else(|| ApiError::NotFound(format!("No habit with id {id}")))?;

    let logs = database.logs_for_habit(id)?;

    Ok(Json(HabitLogsPayload {
        habit_id: id,
        count: logs.len(),
        logs,
    }))
}

async fn habit_reorder(
    State(state): State<ApiState>,
    Json(payload): Json<ReorderPayload>,
) -> ApiResult<Json<Value>> {
    let mut database = Database::open(&state.config.db_path)?;
    database
        .reorder_habits(&payload.ids)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    Ok(Json(json!({ "saved": true })))
}

async fn today(State(state): State<ApiState>) -> ApiResult<Json<TodayPayload>> {
    let database = Database::open(&state.config.db_path)?;
    let date = local_today();

    let habits = database
        .active_habits()?
        .into_iter()
        .map(|habit| {
            let completed = database.is_completed(habit.id, date)?;
            Ok(TodayEntry { habit, completed })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(TodayPayload { date, habits }))
}

async fn log_toggle(
    State(state): State<ApiState>,
    Json(payload): Json<TogglePayload>,
) -> ApiResult<Json<CompletionLog>> {
    let date = match payload.date.as_deref() {
        Some(raw) => parse_date(raw).map_err(|error| ApiError::BadRequest(error.to_string()))?,
        None => local_today(),
    };

    let database = Database::open(&state.config.db_path)?;
    database
        .habit(payload.habit_id)?
        .ok_or_else(|| ApiError::NotFound(format!("No habit with id {}", payload.habit_id)))?;

    let log = database.toggle_completion(payload.habit_id, date)?;

    Ok(Json(log))
}

async fn stats(
    State(state): State<ApiState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<Statistics>> {
    let (start, end) = resolve_stats_range(&query, &state.config)?;

    let database = Database::open(&state.config.db_path)?;
    let habits = database.active_habits()?;
    let logs = database.logs_in_range(start, end)?;

    let statistics = compute_statistics(&habits, &logs, start, end)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    Ok(Json(statistics))
}

async fn history(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryGrid>> {
    let window_days = query.days.unwrap_or(state.config.history_window_days);
    if window_days == 0 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }

    let end = local_today();
    let start = end - Duration::days(i64::from(window_days) - 1);

    let database = Database::open(&state.config.db_path)?;
    let habits = database.active_habits()?;
    let logs = database.logs_in_range(start, end)?;

    let grid = build_history_grid(&habits, &logs, window_days)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    Ok(Json(grid))
}

fn resolve_stats_range(query: &StatsQuery, config: &Config) -> Result<(NaiveDate, NaiveDate), ApiError> {
    match (query.from.as_deref(), query.to.as_deref()) {
        (Some(from), Some(to)) => {
            let start = parse_date(from).map_err(|error| ApiError::BadRequest(error.to_string()))?;
            let end = parse_date(to).map_err(|error| ApiError::BadRequest(error.to_string()))?;
            Ok((start, end))
        }
        (None, None) => {
            let days = query.days.unwrap_or(config.stats_range_days);
            if days == 0 {
                return Err(ApiError::BadRequest("days must be at least 1".to_string()));
            }

            let end = local_today();
            Ok((end - Duration::days(i64::from(days) - 1), end))
        }
        _ => Err(ApiError::BadRequest(
            "from and to must be provided together".to_string(),
        )),
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {input}. Example: 2026-02-18"))
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}
