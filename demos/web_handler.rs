//! Attaching `X-RateLimit-*` headers to an axum response.
//!
//! This is interface-only demo code, not part of the library's public
//! surface — the library has no transport-layer integration. Run with:
//! ```text
//! cargo run --example web_handler --features "memory axum-demo"
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use rush_rs::headers::RateLimitHeaders;
use rush_rs::{GCRALimiter, MemoryStore, Quota, Throttle};

type AppThrottle = Throttle<GCRALimiter<MemoryStore>>;

async fn hello(State(throttle): State<Arc<AppThrottle>>) -> Response {
    let result = match throttle.check("global", 1).await {
        Ok(result) => result,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let mut response = if result.limited {
        (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response()
    } else {
        (StatusCode::OK, "hello").into_response()
    };

    for (name, value) in RateLimitHeaders::from(&result).to_vec() {
        if let Ok(value) = value.parse() {
            response.headers_mut().insert(name, value);
        }
    }

    response
}

#[tokio::main]
async fn main() {
    let throttle = Arc::new(Throttle::new(
        Quota::per_second(5, 0),
        GCRALimiter::new(MemoryStore::new()),
    ));

    let app = Router::new().route("/", get(hello)).with_state(throttle);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("listening on http://127.0.0.1:3000");
    axum::serve(listener, app).await.unwrap();
}
