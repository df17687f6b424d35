//! Backend access. [`ApiClient`] is the only way out to the API; the resource
//! helpers are thin path builders over it.

pub mod auth;
pub mod client;
pub mod errors;
pub mod resources;

pub use client::{ApiClient, CredentialSource, UnauthorizedHandler};
pub use errors::ApiError;
pub use resources::{Entity, Resource, ResourceClient, TruckRegistration};
