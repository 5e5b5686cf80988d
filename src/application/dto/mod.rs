//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so the HTTP adapter can
//! serialize/deserialize without shaping the domain model around JSON.

pub mod battle;
pub mod character;
pub mod equipment;
pub mod error;
pub mod progress;

pub use battle::*;
pub use character::*;
pub use equipment::*;
pub use error::*;
pub use progress::*;
