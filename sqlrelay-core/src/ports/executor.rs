//! Statement executor port

use crate::domain::result::Result;

/// Executes a single SQL statement against a remote target.
///
/// The apply service depends only on this trait; tests substitute a mock,
/// production wires in the HTTP RPC client.
pub trait StatementExecutor: Send + Sync {
    /// Execute one statement. Ok means the target acknowledged success.
    fn execute(&self, sql: &str) -> Result<()>;
}
