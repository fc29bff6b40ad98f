use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    response::Redirect,
};

use crate::{db, error::AppError, AppState};

/// GET /s/:code
///
/// 1. Check the in-memory cache for the short code (fast path — no DB hit).
/// 2. On a cache miss, fall back to the database and backfill the cache.
/// 3. Hand the click to the background recorder without waiting on it.
/// 4. Redirect to the long URL.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    let long_url = match state.cache.get(&code) {
        Some(url) => url,
        None => match db::get_link(&state.db, &code).await? {
            Some(link) => {
                state.cache.set(&link.code, &link.long_url);
                link.long_url
            }
            None => return Err(AppError::NotFound),
        },
    };

    let ip_address = extract_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let user_agent = header_string(&headers, "user-agent");
    let referrer = header_string(&headers, "referer");
    state.clicks.record(&code, ip_address, user_agent, referrer);

    Ok(Redirect::to(&long_url))
}

/// Determine the real client IP, preferring common proxy headers.
fn extract_ip(headers: &HeaderMap, addr: Option<SocketAddr>) -> Option<String> {
    // X-Forwarded-For can be a comma-separated list; take the first entry.
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = xff.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return Some(ip.to_owned());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return Some(real_ip.to_owned());
        }
    }

    addr.map(|a| a.ip().to_string())
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
