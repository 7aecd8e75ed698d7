//! HTTP binding for the relay.
//!
//! Every inbound request, whatever its path or method, runs one relay cycle.

use crate::metrics::MetricsCollector;
use crate::relay::Relay;
use crate::util::RequestId;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{info, instrument, warn};

/// Header carrying the request ID in and out.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Per-connection context shared by the requests it carries.
#[derive(Clone)]
pub struct RelayContext {
    pub client_addr: SocketAddr,
    pub connection_id: RequestId,
    pub metrics: MetricsCollector,
}

/// Run the relay for one inbound request and render its outcome.
#[instrument(skip_all, fields(
    method = %req.method(),
    uri = %req.uri(),
    client = %ctx.client_addr,
    connection_id = %ctx.connection_id
))]
pub async fn handle_request<B>(
    req: Request<B>,
    relay: &Relay,
    ctx: &RelayContext,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let request_id =
        RequestId::from_header(req.headers().get(&REQUEST_ID_HEADER)).unwrap_or_else(RequestId::short);
    let target = &relay.settings().target;

    info!(request_id = %request_id, upstream = %target, "health check request received");

    let timer = ctx.metrics.start_request_timer();
    let outcome = relay.check().await;
    let rendered = relay.respond(&outcome);
    let elapsed = timer.elapsed();
    timer.record(outcome.kind(), rendered.status.as_u16());

    if outcome.is_success() {
        info!(
            request_id = %request_id,
            upstream = %target,
            status = rendered.status.as_u16(),
            duration_ms = elapsed.as_millis(),
            "health check succeeded"
        );
    } else {
        warn!(
            request_id = %request_id,
            upstream = %target,
            outcome = outcome.kind().as_str(),
            status = rendered.status.as_u16(),
            duration_ms = elapsed.as_millis(),
            detail = rendered.body.trim_end(),
            "health check failed"
        );
    }

    let mut response = Response::new(Full::new(Bytes::from(rendered.body)));
    *response.status_mut() = rendered.status;

    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    Ok(response)
}
