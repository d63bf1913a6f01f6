use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    dates,
    logs::repo::{self as logs_repo, LoggedFood},
    nutrition::{
        self, DailyTotals, FoodFact, InvalidEntry, LogEntry, AVERAGE_WINDOW_DAYS,
        STREAK_WINDOW_DAYS,
    },
    profile::repo::{self as profile_repo, Goals},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats/daily", get(daily_stats))
        .route("/stats/overview", get(overview_stats))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// `YYYY-MM-DD`; defaults to today (UTC).
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyStatsResponse {
    #[serde(with = "crate::dates::ymd")]
    pub date: Date,
    pub totals: DailyTotals,
    pub goals: Goals,
    pub remaining_calories: f64,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    #[serde(with = "crate::dates::ymd")]
    pub as_of: Date,
    /// Consecutive goal-adherent days ending yesterday.
    pub streak_days: u32,
    /// Mean calories over the last seven logged days; `null` when nothing
    /// was logged in the window.
    pub weekly_average: Option<f64>,
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn unprocessable(e: InvalidEntry) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

fn parse_date(q: &StatsQuery) -> Result<Date, (StatusCode, String)> {
    match q.date.as_deref() {
        Some(raw) => dates::parse_ymd(raw)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid date: {e}"))),
        None => Ok(dates::today_utc()),
    }
}

fn split_rows(rows: Vec<LoggedFood>) -> (Vec<LogEntry>, HashMap<Uuid, FoodFact>) {
    let mut facts = HashMap::new();
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(fact) = row.food {
            facts.insert(fact.id, fact);
        }
        entries.push(row.entry);
    }
    (entries, facts)
}

/// Consumed totals for one day against the profile goals.
#[instrument(skip(state))]
pub async fn daily_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsQuery>,
) -> Result<Json<DailyStatsResponse>, (StatusCode, String)> {
    let date = parse_date(&q)?;

    let rows = logs_repo::list_for_date(&state.db, user_id, date)
        .await
        .map_err(internal)?;
    let (entries, facts) = split_rows(rows);

    let totals = nutrition::compute_daily_totals(date, &entries, |id| facts.get(&id))
        .map_err(unprocessable)?;
    let goals = profile_repo::goals(&state.db, user_id)
        .await
        .map_err(internal)?;
    let remaining = nutrition::remaining_calories(&totals, goals.calorie_goal);

    Ok(Json(DailyStatsResponse {
        date,
        totals,
        goals,
        remaining_calories: remaining,
    }))
}

/// Adherence streak and rolling average, computed over a window of history
/// ending at the reference date.
#[instrument(skip(state))]
pub async fn overview_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsQuery>,
) -> Result<Json<OverviewResponse>, (StatusCode, String)> {
    let as_of = parse_date(&q)?;
    let start = as_of - Duration::days(i64::from(STREAK_WINDOW_DAYS));

    let rows = logs_repo::list_in_range(&state.db, user_id, start, as_of)
        .await
        .map_err(internal)?;
    let (entries, facts) = split_rows(rows);

    let by_date =
        nutrition::totals_by_date(&entries, |id| facts.get(&id)).map_err(unprocessable)?;
    let goals = profile_repo::goals(&state.db, user_id)
        .await
        .map_err(internal)?;

    let streak_days =
        nutrition::compute_streak(&by_date, goals.calorie_goal, as_of, STREAK_WINDOW_DAYS);
    let weekly_average = nutrition::rolling_average(&by_date, as_of, AVERAGE_WINDOW_DAYS);

    Ok(Json(OverviewResponse {
        as_of,
        streak_days,
        weekly_average,
    }))
}
