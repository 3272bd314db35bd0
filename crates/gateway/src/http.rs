//! Middleware stack around the API router.

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use hh_domain::config::CorsConfig;

use crate::api;
use crate::state::AppState;

/// Router with CORS, request tracing, the global concurrency limit and
/// (when configured) per-IP rate limiting applied.
///
/// The governor keys on the peer address, so serve this with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let server = &state.config.server;

    let router = api::router()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&server.cors))
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            server.max_concurrent_requests,
        ));
    tracing::info!(
        max_concurrent = server.max_concurrent_requests,
        "concurrency limit set"
    );

    // ── Rate-limit layer (per-IP token bucket via governor) ─────────
    let Some(rl) = &server.rate_limit else {
        tracing::info!("per-IP rate limiting disabled (no [server.rate_limit] in config)");
        return Ok(router.with_state(state));
    };

    use tower_governor::governor::GovernorConfigBuilder;
    use tower_governor::GovernorLayer;

    let gov_config = GovernorConfigBuilder::default()
        .per_second(rl.requests_per_second)
        .burst_size(rl.burst_size)
        .finish()
        .ok_or_else(|| {
            anyhow::anyhow!("rate_limit: requests_per_second and burst_size must be > 0")
        })?;

    tracing::info!(
        requests_per_second = rl.requests_per_second,
        burst_size = rl.burst_size,
        "per-IP rate limiting enabled"
    );

    Ok(router
        .layer(GovernorLayer {
            config: std::sync::Arc::new(gov_config),
        })
        .with_state(state))
}

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Entries ending in `:*` match any port on that host.  A lone `"*"`
/// allows every origin.
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION];

    // allow_credentials is incompatible with wildcard origins.
    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\", all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            wildcard_prefixes.push(origin.trim_end_matches('*').to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            let origin_str = origin.to_str().unwrap_or("");
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}
