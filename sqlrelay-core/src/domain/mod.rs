//! Core domain entities
//!
//! Pure data structures and text processing - no I/O except script loading,
//! no external services.

mod report;
mod script;
mod statement;
pub mod result;

pub use report::{ApplyReport, StatementOutcome, StatementReport};
pub use script::MigrationScript;
pub use statement::{split_statements, Action, Statement};
