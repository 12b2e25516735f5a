//! Invocation-envelope plumbing.
//!
//! Request normalization and response shaping for direct, HTTP-gateway
//! (v1/v2), and SNS-style invocations.

pub mod request;
pub mod response;

pub use {
    request::NormalizedRequest,
    response::{BuildOptions, Protocol, ResponseBuilder},
};
