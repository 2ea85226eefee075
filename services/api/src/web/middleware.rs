//! services/api/src/web/middleware.rs
//!
//! Per-client request limiting for the `/api` routes: a fixed one-minute
//! window counted per remote IP.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tracing::warn;

use crate::web::{error::HttpError, state::AppState};

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    max: u32,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_minute(max: u32) -> Self {
        Self::new(max, RATE_LIMIT_WINDOW)
    }

    /// Counts one request from `client`; false once the window's budget is spent.
    pub fn check(&self, client: IpAddr, now: Instant) -> bool {
        let Ok(mut clients) = self.clients.lock() else {
            // A poisoned map only loses counts; let the request through.
            return true;
        };

        // Drop idle clients so the map does not grow without bound.
        let window = self.window;
        clients.retain(|_, w| now.duration_since(w.started) < window);

        let entry = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        entry.count += 1;
        entry.count <= self.max
    }
}

/// Rejects a request with 429 once its client has exceeded the per-minute budget.
///
/// Requests without connection info (e.g. in-process tests) share one bucket.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.rate_limiter.check(client, Instant::now()) {
        warn!(%client, "Rate limit exceeded");
        return HttpError::TooManyRequests.into_response();
    }
    next.run(req).await
}
