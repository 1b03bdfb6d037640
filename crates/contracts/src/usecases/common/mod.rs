//! Common types shared by all UseCases

pub mod remote_error;

// Re-exports
pub use remote_error::{ErrorOrigin, RemoteError, RemoteOperation, RemoteResult};
