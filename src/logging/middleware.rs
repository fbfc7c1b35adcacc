use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Instrument;

/// Probe paths that load balancers hit constantly; logged at debug.
const QUIET_PREFIX: &str = "/health";

fn request_id(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

fn record_outcome(status: StatusCode, elapsed_ms: u64, quiet: bool) {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), elapsed_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(status = status.as_u16(), elapsed_ms, "request rejected");
    } else if quiet {
        tracing::debug!(status = status.as_u16(), elapsed_ms, "probe answered");
    } else {
        tracing::info!(status = status.as_u16(), elapsed_ms, "request completed");
    }
}

/// Runs the request inside an `http` span carrying its id, method and path,
/// then logs one line with the status and timing.
pub async fn log_request(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "http",
        request_id = %request_id(&request),
        method = %request.method(),
        path = %request.uri().path(),
    );
    let quiet = request.uri().path().starts_with(QUIET_PREFIX);

    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        record_outcome(response.status(), started.elapsed().as_millis() as u64, quiet);
        response
    }
    .instrument(span)
    .await
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
