//! Error handling and classification module
//!
//! Raw request failures (`FailureReason`) are mapped onto a closed set of
//! user-facing categories (`ErrorCategory`) and wrapped in a
//! `ClassifiedError` that carries the message and the action that failed.

pub mod classification;
pub mod failure;

pub use classification::{classify, ClassifiedError, ErrorCategory};
pub use failure::FailureReason;
