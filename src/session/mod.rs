//! Client session subsystem.
//!
//! # States
//! - Unauthenticated: no usable token
//! - Restoring: persisted token found, identity not yet confirmed
//! - Authenticated: token and identity confirmed
//! - Error: transient; a failed login settles back to Unauthenticated
//!
//! # State Transitions
//! ```text
//! start (token persisted)      → Restoring
//! start (no token)             → Unauthenticated
//! Restoring → Authenticated    : identity fetch returns a user with an id
//! Restoring → Unauthenticated  : identity fetch fails; token discarded
//! Unauthenticated → Authenticated : login (token exchange + identity fetch)
//! Unauthenticated → Error → Unauthenticated : login fails
//! any → Unauthenticated        : logout
//! ```
//!
//! # Design Decisions
//! - register never changes the session; logging in is a separate step
//! - Async mutations (restore, login, register) are serialized
//! - Readers get lock-free snapshots

pub mod machine;
pub mod state;
pub mod store;

pub use machine::{AuthOutcome, Session};
pub use state::{SessionEvent, SessionSnapshot, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore, TOKEN_KEY};
