//! Settings shared by the command line tools.

use std::path::{Path, PathBuf};

use crate::PasswordHash;

/// The database file used when no path is given.
pub const DEFAULT_DB_PATH: &str = "finance_manager.db";

/// Errors in the settings given to the command line tools.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// The database path has no file extension, which usually means a
    /// directory or a typo was given instead of a database file.
    #[error("database path {0:?} must include a file extension (e.g., 'my_database.db')")]
    MissingExtension(PathBuf),

    /// The database path points at a directory.
    #[error("database path {0:?} is a directory")]
    IsDirectory(PathBuf),

    /// The bcrypt cost is outside the range bcrypt accepts.
    #[error("the password hashing cost must be between 4 and 31, got {0}")]
    InvalidCost(u32),
}

/// Where the application keeps its data and how it hashes passwords.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The SQLite database file.
    pub db_path: PathBuf,
    /// An optional file that receives debug logs.
    pub log_file: Option<PathBuf>,
    /// The bcrypt cost used when registering accounts.
    pub password_cost: u32,
}

impl Config {
    /// Create and validate a new configuration.
    ///
    /// # Errors
    /// Returns a [ConfigError] if `db_path` does not look like a database
    /// file or `password_cost` is not accepted by bcrypt.
    pub fn new(
        db_path: PathBuf,
        log_file: Option<PathBuf>,
        password_cost: u32,
    ) -> Result<Self, ConfigError> {
        validate_db_path(&db_path)?;

        if !(4..=31).contains(&password_cost) {
            return Err(ConfigError::InvalidCost(password_cost));
        }

        Ok(Self {
            db_path,
            log_file,
            password_cost,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_file: None,
            password_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

/// Check that `db_path` names a file with an extension, e.g. `finance.db`.
///
/// The file does not have to exist yet.
///
/// # Errors
/// Returns a [ConfigError] if the path has no extension or is a directory.
pub fn validate_db_path(db_path: &Path) -> Result<(), ConfigError> {
    match db_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => return Err(ConfigError::MissingExtension(db_path.to_owned())),
    }

    if db_path.is_dir() {
        return Err(ConfigError::IsDirectory(db_path.to_owned()));
    }

    Ok(())
}
