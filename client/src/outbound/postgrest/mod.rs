//! PostgREST outbound adapter.
//!
//! This module provides a thin HTTP implementation of the `TableStore`
//! port against a PostgREST-style REST surface.

mod http_store;

pub use http_store::PostgrestStore;
