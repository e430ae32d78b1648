//! redsol - terminal console and client for the Red Soluciones ISP backend.
//!
//! The library holds everything the `redsol` binary uses: the resilient
//! request executor, the error classifier and notices, the field validator,
//! the typed API client and the console actions built on top of them.

pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod notification;
pub mod request;
pub mod session;
pub mod state;
pub mod ui;
pub mod validation;

pub use api::ApiClient;
pub use console::{Console, ConsoleError};
pub use error::{classify, ClassifiedError, ErrorCategory, FailureReason};
pub use notification::{Notice, Notifier};
pub use request::{RequestExecutor, RetryPolicy};
pub use validation::{validate, FieldRecord, RecordKind, ValidationResult};
