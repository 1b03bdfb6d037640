pub mod aggregate;

pub use aggregate::LineRecord;
