//! Session feature: storage, state and the controller that ties them to the
//! API client. Token material never leaves this module except as the bearer
//! header and the store record.

pub mod controller;
pub mod state;
pub mod store;
pub mod types;

pub use controller::{AuthError, AuthSession};
pub use state::{SessionState, SessionStatus};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError, StoredSession};
pub use types::{Credential, LoginCredentials, LoginIdentifier, UserProfile, UserRole};
