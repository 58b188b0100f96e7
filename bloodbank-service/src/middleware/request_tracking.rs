//! Request tracking middleware
//!
//! Every request gets an `x-request-id` (kept if the client sent one) that
//! is echoed on the response and recorded on the trace span.

use http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Request ID header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generates `req_`-prefixed, time-sortable request IDs (UUIDv7)
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTimeOrderedRequestId;

impl MakeRequestId for MakeTimeOrderedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = format!("req_{}", uuid::Uuid::now_v7().simple());
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Create a request ID layer that assigns an ID to requests lacking one
pub fn request_id_layer() -> SetRequestIdLayer<MakeTimeOrderedRequestId> {
    SetRequestIdLayer::new(
        HeaderName::from_static(REQUEST_ID_HEADER),
        MakeTimeOrderedRequestId,
    )
}

/// Create a request ID propagation layer
pub fn request_id_propagation_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER))
}
