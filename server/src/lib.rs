//! HTTP backend for card score.
//!
//! Every action under `/api` resolves a session key, runs one ledger
//! operation and answers with the full ledger snapshot.

use axum::{
    body::Bytes,
    extract::{Query, State as AxumState},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cardscore_execution::{
    apply_round, clear_scores, reset_to_setup, rotate, setup, themed_names, Outcome,
};
use cardscore_types::{
    api::{
        name_count, parse_body, ErrorResponse, RequestError, RotateRequest, RoundRequest,
        SetupRequest,
    },
    Ledger, DEFAULT_SESSION, SESSION_HEADER, SESSION_QUERY,
};
use serde::Deserialize;
use std::{path::PathBuf, sync::Arc};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};
use tracing::{debug, info, warn};

pub mod config;
mod store;

pub use config::{Config, ConfigError, RateLimit, ValidatedConfig};
pub use store::{LedgerStore, MemoryStore};

pub struct Api<S> {
    store: Arc<S>,
    static_dir: Option<PathBuf>,
    cors: bool,
    rate_limit: Option<RateLimit>,
}

impl<S: LedgerStore> Api<S> {
    /// API over `store` with no static files, CORS or rate limiting.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            static_dir: None,
            cors: false,
            rate_limit: None,
        }
    }

    pub fn from_config(store: Arc<S>, config: &ValidatedConfig) -> Self {
        let mut api = Self::new(store).with_cors(config.cors);
        if let Some(dir) = &config.static_dir {
            api = api.with_static_dir(dir.clone());
        }
        if let Some(limit) = config.rate_limit {
            api = api.with_rate_limit(limit);
        }
        api
    }

    /// Serve the web client from `dir`, falling back to its `index.html`.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }

    pub fn with_rate_limit(mut self, limit: RateLimit) -> Self {
        self.rate_limit = Some(limit);
        self
    }

    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/game", get(get_game::<S>))
            .route("/game/setup", post(setup_game::<S>))
            .route("/game/round", post(play_round::<S>))
            .route("/game/rotate", post(rotate_players::<S>))
            .route("/game/back", post(back_to_setup::<S>))
            .route("/game/clear", post(clear_game::<S>))
            .route("/names", get(names))
            .fallback(not_found)
            .with_state(self.store.clone());

        let router = Router::new().nest("/api", api);
        let mut router = match &self.static_dir {
            Some(dir) => router.fallback_service(
                ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
            ),
            None => router.fallback(not_found),
        };

        if self.cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)]);
            router = router.layer(cors);
        }

        if let Some(limit) = self.rate_limit {
            match GovernorConfigBuilder::default()
                .per_millisecond(limit.period_ms)
                .burst_size(limit.burst)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
            {
                Some(config) => {
                    router = router.layer(GovernorLayer {
                        config: Arc::new(config),
                    });
                }
                None => warn!(?limit, "invalid rate limit, serving without one"),
            }
        }

        router
    }
}

/// Query string pairs in arrival order. Decoding never fails, and a key that
/// repeats resolves to its first value.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

fn session_key(headers: &HeaderMap, query: &QueryParams) -> String {
    let header = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok());
    [header, query.first(SESSION_QUERY)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}

/// Shape error answered with `400 Bad Request`.
struct BadRequest(RequestError);

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

fn reject(session: &str, action: &'static str, err: RequestError) -> BadRequest {
    debug!(session, action, %err, "rejected request");
    BadRequest(err)
}

/// Runs `op` on the session's ledger and returns the resulting snapshot.
fn act<S: LedgerStore>(
    store: &S,
    session: &str,
    action: &'static str,
    op: impl FnOnce(&mut Ledger) -> Outcome,
) -> Json<Ledger> {
    store.with_ledger(session, |ledger| {
        match op(ledger) {
            Outcome::Applied => info!(session, action, "applied"),
            Outcome::Ignored(reason) => debug!(session, action, ?reason, "ignored"),
        }
        Json(ledger.clone())
    })
}

async fn get_game<S: LedgerStore>(
    AxumState(store): AxumState<Arc<S>>,
    headers: HeaderMap,
    Query(query): Query<QueryParams>,
) -> Json<Ledger> {
    Json(store.snapshot(&session_key(&headers, &query)))
}

async fn setup_game<S: LedgerStore>(
    AxumState(store): AxumState<Arc<S>>,
    headers: HeaderMap,
    Query(query): Query<QueryParams>,
    body: Bytes,
) -> Result<Json<Ledger>, BadRequest> {
    let session = session_key(&headers, &query);
    let request = parse_body::<SetupRequest>(&body)
        .and_then(SetupRequest::validate)
        .map_err(|err| reject(&session, "setup", err))?;
    Ok(act(store.as_ref(), &session, "setup", |ledger| {
        setup(
            ledger,
            request.num_players,
            request.bet,
            &request.player_names,
        )
    }))
}

async fn play_round<S: LedgerStore>(
    AxumState(store): AxumState<Arc<S>>,
    headers: HeaderMap,
    Query(query): Query<QueryParams>,
    body: Bytes,
) -> Result<Json<Ledger>, BadRequest> {
    let session = session_key(&headers, &query);
    let round = parse_body::<RoundRequest>(&body)
        .and_then(RoundRequest::validate)
        .map_err(|err| reject(&session, "round", err))?;
    let Some(round) = round else {
        debug!(session, "winner names no player");
        return Ok(Json(store.snapshot(&session)));
    };
    Ok(act(store.as_ref(), &session, "round", |ledger| {
        apply_round(ledger, round.winner_player_id)
    }))
}

async fn rotate_players<S: LedgerStore>(
    AxumState(store): AxumState<Arc<S>>,
    headers: HeaderMap,
    Query(query): Query<QueryParams>,
    body: Bytes,
) -> Result<Json<Ledger>, BadRequest> {
    let session = session_key(&headers, &query);
    let request = parse_body::<RotateRequest>(&body)
        .map_err(|err| reject(&session, "rotate", err))?
        .validate();
    Ok(act(store.as_ref(), &session, "rotate", |ledger| {
        rotate(
            ledger,
            request.leave_player_id,
            request.new_player_name.as_deref(),
        )
    }))
}

async fn back_to_setup<S: LedgerStore>(
    AxumState(store): AxumState<Arc<S>>,
    headers: HeaderMap,
    Query(query): Query<QueryParams>,
) -> Json<Ledger> {
    let session = session_key(&headers, &query);
    act(store.as_ref(), &session, "back", reset_to_setup)
}

async fn clear_game<S: LedgerStore>(
    AxumState(store): AxumState<Arc<S>>,
    headers: HeaderMap,
    Query(query): Query<QueryParams>,
) -> Json<Ledger> {
    let session = session_key(&headers, &query);
    act(store.as_ref(), &session, "clear", clear_scores)
}

async fn names(Query(query): Query<QueryParams>) -> Json<Vec<String>> {
    let count = name_count(query.first("count"));
    Json(themed_names(count, &mut rand::thread_rng()))
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}
