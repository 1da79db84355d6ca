//! Axum REST API handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};
use url::form_urlencoded::byte_serialize;

use crate::db;
use crate::errors::Result;
use crate::issuer::{self, GameConfig};
use crate::models::LeaderboardEntry;
use crate::planner::{self, Plan};
use crate::selector::{self, PickedUrls};
use crate::signing::PlaySigner;
use crate::storage::StorageClient;
use crate::validator::{self, Rejection, ScoreSubmission};

const DEFAULT_LEADERBOARD_SIZE: i64 = 25;
const MAX_LEADERBOARD_SIZE: i64 = 100;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub storage: StorageClient,
    pub signer: PlaySigner,
    pub sprites_prefix: String,
    pub backgrounds_prefix: String,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OneShotParams {
    pub prompt: Option<String>,
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub slug: Option<String>,
    pub n: Option<String>,
}

#[derive(Serialize)]
pub struct AssetCounts {
    pub sprites: usize,
    pub backgrounds: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
    pub assets: AssetCounts,
    pub db: &'static str,
}

#[derive(Serialize)]
pub struct OneShotResponse {
    pub ok: bool,
    pub counts: AssetCounts,
    pub plan: Plan,
    pub picks: PickedUrls,
    pub next: String,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub ok: bool,
    pub slug: String,
    pub top: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: error.into(),
        }),
    )
        .into_response()
}

fn found(location: &str) -> Response {
    let headers = [(header::LOCATION, location.to_string())];
    (StatusCode::FOUND, headers).into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let (sprites, backgrounds) = tokio::join!(
        state.storage.list_images(&state.sprites_prefix),
        state.storage.list_images(&state.backgrounds_prefix),
    );
    let db = match db::ping(&state.pool).await {
        Ok(()) => "ok",
        Err(e) => {
            error!("Health check database ping failed: {e}");
            "fail"
        }
    };

    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        assets: AssetCounts {
            sprites: sprites.len(),
            backgrounds: backgrounds.len(),
        },
        db,
    })
}

/// `GET /api/one-shot?prompt=…[&redirect=0]`
///
/// Plans a game for the prompt, picks assets and issues a signed config.
/// Redirects to the player unless `redirect=0`, in which case the
/// intermediate plan and picks are returned as JSON.
pub async fn one_shot(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<OneShotParams>,
) -> Response {
    let prompt = params.prompt.unwrap_or_default();
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "missing_prompt");
    }

    let plan = planner::plan(prompt);
    let (sprites, backgrounds) = tokio::join!(
        state.storage.list_images(&state.sprites_prefix),
        state.storage.list_images(&state.backgrounds_prefix),
    );
    let picks = selector::select(&plan, &sprites, &backgrounds);
    let config = issuer::issue(&state.signer, &plan, prompt, &picks, Utc::now());

    let next = match play_url(&config) {
        Ok(url) => url,
        Err(e) => {
            error!("Failed to encode config {}: {e}", config.slug);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    info!(
        "Issued config {} ({} sprites, {} backgrounds)",
        config.slug,
        sprites.len(),
        backgrounds.len()
    );

    if params.redirect.as_deref() == Some("0") {
        return Json(OneShotResponse {
            ok: true,
            counts: AssetCounts {
                sprites: sprites.len(),
                backgrounds: backgrounds.len(),
            },
            plan,
            picks: picks.urls(),
            next,
        })
        .into_response();
    }
    found(&next)
}

/// `GET /api/daily`
///
/// Redirects to the one-shot endpoint with today's shared prompt.
pub async fn daily() -> Response {
    found(&daily_location(Utc::now().date_naive()))
}

/// `POST /api/score`
pub async fn submit_score(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // An unparseable body is just a submission with nothing in it.
    let submission: ScoreSubmission = serde_json::from_slice(&body).unwrap_or_default();
    let ip = client_ip(&headers, peer);

    let fields = match validator::validate(&state.signer, &submission, &ip, Utc::now()) {
        Ok(fields) => fields,
        Err(rejection) => {
            match rejection {
                Rejection::BadParams => debug!("Score rejected: {rejection}"),
                Rejection::BadSig => warn!(
                    "Score rejected: {rejection} (slug={:?})",
                    submission.slug.as_deref().unwrap_or_default()
                ),
                _ => info!("Score rejected: {rejection}"),
            }
            return error_response(rejection_status(rejection), rejection.as_str());
        }
    };

    match db::insert_score(&state.pool, &fields).await {
        Ok(_) => {
            info!("Recorded score {} for {}", fields.score, fields.slug);
            Json(OkResponse { ok: true }).into_response()
        }
        Err(e) => {
            error!("Failed to persist score: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `GET /api/leaderboard?slug=…[&n=…]`
pub async fn leaderboard(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<LeaderboardParams>,
) -> Response {
    let slug = params.slug.unwrap_or_default();
    if slug.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "missing_slug");
    }
    let limit = leaderboard_limit(params.n.as_deref());

    match db::top_scores(&state.pool, &slug, limit).await {
        Ok(top) => Json(LeaderboardResponse {
            ok: true,
            slug,
            top,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

/// Player URL with the config embedded as base64url JSON.
pub fn play_url(config: &GameConfig) -> Result<String> {
    let json = serde_json::to_vec(config)?;
    Ok(format!("/play.html?data={}", URL_SAFE_NO_PAD.encode(json)))
}

pub fn daily_prompt(date: NaiveDate) -> String {
    format!("Daily Seed {} neon canyon shmup", date.format("%Y-%m-%d"))
}

fn daily_location(date: NaiveDate) -> String {
    let prompt = daily_prompt(date);
    let encoded: String = byte_serialize(prompt.as_bytes()).collect();
    format!("/api/one-shot?prompt={encoded}")
}

/// First `X-Forwarded-For` hop, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| peer.ip().to_string())
}

pub fn leaderboard_limit(n: Option<&str>) -> i64 {
    n.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
        .clamp(1, MAX_LEADERBOARD_SIZE)
}

pub fn rejection_status(rejection: Rejection) -> StatusCode {
    match rejection {
        Rejection::BadSig => StatusCode::FORBIDDEN,
        Rejection::BadParams
        | Rejection::Expired
        | Rejection::RunMsOutOfRange
        | Rejection::ScoreOutOfRange => StatusCode::BAD_REQUEST,
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
