#![doc = include_str!("../README.md")]

#[cfg(feature = "client")]
pub mod client;
pub mod error;
#[cfg(feature = "server")]
pub mod middleware;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
pub use token::generate_session_id;
pub use types::{AuthStatus, LoginRequest, LoginResponse, LogoutResponse, Principal, SessionId};
