//! HTTP middleware

pub mod request_tracking;

pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, MakeTimeOrderedRequestId, REQUEST_ID_HEADER,
};
