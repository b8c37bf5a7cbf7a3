//! Axum REST API handlers over the read model.
//!
//! Consumers must tolerate eventual consistency: a round whose program or
//! strategy events are still catching up is absent from listings until the
//! projector accepts it.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{self, ApplicationRow, ProgramRow, RoundRow, VoteRow};
use crate::errors::IndexerError;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ProgramsResponse {
    pub count: usize,
    pub programs: Vec<ProgramRow>,
}

#[derive(Serialize)]
pub struct RoundsResponse {
    pub count: usize,
    pub rounds: Vec<RoundRow>,
}

#[derive(Serialize)]
pub struct ApplicationsResponse {
    pub round: String,
    pub count: usize,
    pub applications: Vec<ApplicationRow>,
}

#[derive(Serialize)]
pub struct VotesResponse {
    pub round: String,
    pub count: usize,
    pub votes: Vec<VoteRow>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn db_error(e: IndexerError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /programs`
pub async fn list_programs(State(state): State<Arc<ApiState>>) -> Response {
    match db::list_programs(&state.pool).await {
        Ok(programs) => Json(ProgramsResponse {
            count: programs.len(),
            programs,
        })
        .into_response(),
        Err(e) => db_error(e),
    }
}

/// `GET /programs/:id/rounds`
pub async fn program_rounds(
    State(state): State<Arc<ApiState>>,
    Path(program_id): Path<i64>,
) -> Response {
    match db::rounds_for_program(&state.pool, program_id).await {
        Ok(rounds) => Json(RoundsResponse {
            count: rounds.len(),
            rounds,
        })
        .into_response(),
        Err(e) => db_error(e),
    }
}

/// `GET /rounds`
pub async fn list_rounds(State(state): State<Arc<ApiState>>) -> Response {
    match db::list_rounds(&state.pool).await {
        Ok(rounds) => Json(RoundsResponse {
            count: rounds.len(),
            rounds,
        })
        .into_response(),
        Err(e) => db_error(e),
    }
}

/// `GET /rounds/:address`
pub async fn get_round(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    match db::get_round(&state.pool, &address).await {
        Ok(Some(round)) => Json(round).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("round {address} not indexed"),
            }),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

/// `GET /rounds/:address/applications`
pub async fn round_applications(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    match db::applications_for_round(&state.pool, &address).await {
        Ok(applications) => Json(ApplicationsResponse {
            round: address,
            count: applications.len(),
            applications,
        })
        .into_response(),
        Err(e) => db_error(e),
    }
}

/// `GET /rounds/:address/votes`
pub async fn round_votes(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    match db::votes_for_round(&state.pool, &address).await {
        Ok(votes) => Json(VotesResponse {
            round: address,
            count: votes.len(),
            votes,
        })
        .into_response(),
        Err(e) => db_error(e),
    }
}
