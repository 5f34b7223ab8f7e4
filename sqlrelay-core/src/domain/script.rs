//! Migration script loading
//!
//! A script is an immutable text blob. Loading fails fast: an unreadable
//! file aborts the run before any network call is made.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};
use crate::domain::statement::{split_statements, Statement};

/// A loaded migration script
#[derive(Debug, Clone)]
pub struct MigrationScript {
    /// Where the script came from (path or `<stdin>`)
    pub source: String,
    /// Full script text
    pub sql: String,
    /// SHA-256 of the script text, hex encoded
    pub checksum: String,
}

impl MigrationScript {
    /// Load a script from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let sql = std::fs::read_to_string(path).map_err(|e| {
            Error::script(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_sql(path.display().to_string(), sql))
    }

    /// Build a script from already-read text (stdin input)
    pub fn from_sql(source: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let checksum = hex::encode(Sha256::digest(sql.as_bytes()));
        Self {
            source: source.into(),
            sql,
            checksum,
        }
    }

    /// Candidate statements, in source order
    pub fn statements(&self) -> Vec<Statement> {
        split_statements(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = MigrationScript::load(Path::new("/nonexistent/migration.sql"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    #[test]
    fn test_load_reads_full_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "CREATE TABLE t (id int);").unwrap();

        let script = MigrationScript::load(file.path()).unwrap();
        assert_eq!(script.sql, "CREATE TABLE t (id int);");
        assert_eq!(script.statements().len(), 1);
    }

    #[test]
    fn test_checksum_is_stable_per_content() {
        let a = MigrationScript::from_sql("a.sql", "CREATE TABLE t (id int);");
        let b = MigrationScript::from_sql("b.sql", "CREATE TABLE t (id int);");
        let c = MigrationScript::from_sql("c.sql", "CREATE TABLE u (id int);");
        assert_eq!(a.checksum, b.checksum);
        assert_ne!(a.checksum, c.checksum);
        assert_eq!(a.checksum.len(), 64);
    }
}
