pub mod aggregate;

pub use aggregate::{parse, DocumentKey, MalformedTokenError, ScanIdentity, ScannedToken};
