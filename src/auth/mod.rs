//! Password and refresh-token authentication.
//!
//! Dual-token system: short-lived access tokens (15 min, stateless) and
//! long-lived refresh tokens (7 days). Only a fingerprint of the current
//! refresh token is stored, and it is replaced on every signin and refresh,
//! so each refresh token can be used once.

mod bearer;
mod errors;
mod gate;
mod service;
mod types;

pub use bearer::get_bearer_token;
pub use errors::{AuthError, GateErrorKind, GateRejection};
pub use gate::{GateState, admit, gate};
pub use service::AuthService;
pub use types::{Caller, Credentials};
