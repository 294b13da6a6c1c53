//! Outbound adapters implementing domain ports for the hosted backend.
//!
//! Adapters are thin translators between domain types and the backend's
//! HTTP surface. They own transport details only and contain no business
//! logic:
//!
//! - **postgrest**: reqwest-backed implementation of the `TableStore` port
//! - **gotrue**: reqwest-backed implementation of the `AuthGateway` port

pub mod gotrue;
pub mod postgrest;
