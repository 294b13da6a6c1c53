//! GoTrue outbound adapter.
//!
//! This module provides a thin HTTP implementation of the `AuthGateway`
//! port against a GoTrue-style authentication service.

mod dto;
mod http_gateway;

pub use http_gateway::GotrueGateway;
