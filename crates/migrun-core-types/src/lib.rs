//! Core types shared across migrun crates
//!
//! - **Correlation**: `RunId`, `RunContext` tie every log line of one
//!   `up`/`down`/`status` invocation together
//! - **Sensitive data**: `Sensitive<T>` keeps database locators out of logs
//! - **Schema constants**: canonical logging field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RunContext, RunId};
pub use sensitive::Sensitive;
