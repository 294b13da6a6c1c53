//! Domain primitives, services, and ports.
//!
//! Purpose: define the strongly typed records held by the data layer, the
//! session/identity types produced by resolution, and the two services that
//! drive them. Ports describe the hosted backend the domain talks to;
//! adapters live under `crate::outbound`.
//!
//! Public surface:
//! - Records: `Member`, `Announcement`, `Event`, `Payment` and their
//!   draft/patch companions.
//! - Session types: `AuthSession`, `AuthUser`, `SessionUser`,
//!   `LoginCredentials`, `Registration`.
//! - Services: `IdentityResolver` (session to user) and `Directory`
//!   (collection loading and mutation).
//! - `Error`/`ErrorCode`: the operation error payload surfaced to callers.

pub mod announcement;
pub mod directory;
pub mod error;
pub mod event;
pub mod member;
pub mod payment;
pub mod ports;
pub mod resolver;
pub mod session;
mod wire;

pub use self::announcement::{Announcement, AnnouncementPatch, NewAnnouncement};
pub use self::directory::{Directory, MembershipFilter};
pub use self::error::{Error, ErrorCode};
pub use self::event::{Event, EventKind, EventPatch, NewEvent};
pub use self::member::{Member, MemberPatch, Role};
pub use self::payment::{NewPayment, Payment, PaymentPatch, PaymentStatus};
pub use self::resolver::IdentityResolver;
pub use self::session::{
    AuthSession, AuthUser, LoginCredentials, LoginValidationError, Registration, SessionUser,
};

/// Convenient result alias for data-layer operations.
pub type OpResult<T> = Result<T, Error>;
