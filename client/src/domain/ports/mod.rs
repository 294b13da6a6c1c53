//! Domain ports describing the hosted backend.
//!
//! Ports define how the domain talks to driven adapters (the hosted table
//! backend and the auth service). Each trait exposes strongly typed errors
//! so adapters map their failures into predictable variants.

mod auth_gateway;
mod table_store;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthError, AuthGateway, FixtureAuthGateway};
#[cfg(test)]
pub use table_store::MockTableStore;
pub use table_store::{
    FixtureTableStore, Order, Returning, SelectQuery, StoreError, Table, TableStore, WireRow,
};
