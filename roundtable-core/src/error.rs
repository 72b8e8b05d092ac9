//! Error types for the Roundtable core library.
//!
//! This module provides a unified error handling system for all Roundtable
//! operations, including storage, configuration, room management, round
//! orchestration, and context extraction.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Database | Database connection, query, migration errors |
//! | E2001-E2099 | Config | Environment, config file, and validation errors |
//! | E3001-E3099 | Room | Room, member, and engine lookup errors |
//! | E4001-E4099 | Round | Chat round validation and turn errors |
//! | E5001-E5099 | Extraction/API | External fetch, parse, and extraction errors |
//! | E9001-E9099 | General | Internal, IO, serialization, and validation errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// The main error type for the Roundtable core library.
///
/// This enum covers all possible error conditions that can occur during
/// Roundtable operations, providing detailed context for debugging and user
/// feedback.
#[derive(Debug, Error)]
pub enum RoundtableError {
    // ========================================================================
    // Database Errors (E1001-E1099)
    // ========================================================================
    /// Failed to establish database connection
    #[error("[E1001] Database connection failed: {message}")]
    DatabaseConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database query execution failed
    #[error("[E1002] Database query failed: {0}")]
    DatabaseQueryFailed(String),

    /// Database migration failed
    #[error("[E1003] Database migration failed: {0}")]
    DatabaseMigrationFailed(String),

    /// Database pool exhausted or unavailable
    #[error("[E1004] Database pool unavailable: {0}")]
    DatabasePoolUnavailable(String),

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Required environment variable is missing
    #[error("[E2001] Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has invalid value
    #[error("[E2002] Invalid environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// Configuration file not found
    #[error("[E2003] Configuration file not found: {0}")]
    ConfigFileNotFound(String),

    /// Configuration file parse error
    #[error("[E2004] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2005] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// Configuration error (generic)
    #[error("[E2006] Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Room Errors (E3001-E3099)
    // ========================================================================
    /// Room not found in the database
    #[error("[E3001] Room not found: {0}")]
    RoomNotFound(i64),

    /// Member not found in the database
    #[error("[E3002] Agent not found: {0}")]
    MemberNotFound(i64),

    /// Engine name does not match any supported engine
    #[error("[E3003] Unknown engine: {0}")]
    UnknownEngine(String),

    /// Member repository path is missing or does not exist
    #[error("[E3004] Repository path does not exist: {0}")]
    InvalidRepoPath(String),

    // ========================================================================
    // Round Errors (E4001-E4099)
    // ========================================================================
    /// Chat message had no content after trimming
    #[error("[E4001] Message content is required")]
    EmptyMessage,

    /// Mention resolution produced no agents to run
    #[error("[E4002] No agents available in this room")]
    NoRecipients,

    /// A member turn exceeded the configured time limit
    #[error("[E4003] Agent '{member}' timed out after {seconds} seconds")]
    TurnTimeout { member: String, seconds: u64 },

    // ========================================================================
    // Extraction/API Errors (E5001-E5099)
    // ========================================================================
    /// External API request failed
    #[error("[E5001] API request failed: {0}")]
    ApiRequestFailed(String),

    /// Failed to parse API response
    #[error("[E5002] Failed to parse API response: {0}")]
    ApiParseError(String),

    /// API rate limit exceeded
    #[error("[E5003] Rate limit exceeded for {service}, retry after {retry_after_secs}s")]
    ApiRateLimitExceeded {
        service: String,
        retry_after_secs: u64,
    },

    /// API authentication failed
    #[error("[E5004] Authentication failed for {service}: {message}")]
    ApiAuthenticationFailed { service: String, message: String },

    /// External API service unavailable
    #[error("[E5005] API service unavailable: {0}")]
    ApiServiceUnavailable(String),

    /// External request timed out
    #[error("[E5006] Request timed out after {0} seconds")]
    RequestTimeout(u64),

    /// URL fetch returned a non-success status
    #[error("[E5007] Failed to fetch URL: {0}")]
    UrlFetchFailed(String),

    /// Fetched page produced no readable text
    #[error("[E5008] Could not extract readable content from this URL")]
    NoReadableContent,

    /// Notion URL does not contain a page id
    #[error("[E5009] Invalid Notion page URL")]
    InvalidNotionUrl,

    /// Required API key is not configured
    #[error("[E5010] {0}")]
    MissingApiKey(String),

    /// Uploaded file produced no text
    #[error("[E5011] No text content could be extracted from this file")]
    EmptyExtraction,

    /// Uploaded PDF could not be parsed
    #[error("[E5012] Failed to extract text from PDF: {0}")]
    PdfExtractFailed(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (unexpected state)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Input validation failed
    #[error("[E9002] {0}")]
    ValidationError(String),

    /// IO error
    #[error("[E9003] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9004] Serialization error: {0}")]
    SerializationError(String),
}

impl RoundtableError {
    /// Create a database connection error from a string message.
    pub fn database_connection_failed(message: impl Into<String>) -> Self {
        RoundtableError::DatabaseConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a database connection error with a source error.
    pub fn database_connection_failed_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RoundtableError::DatabaseConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error from a string message.
    pub fn validation(message: impl Into<String>) -> Self {
        RoundtableError::ValidationError(message.into())
    }
}

/// Result type alias for Roundtable operations.
pub type RoundtableResult<T> = Result<T, RoundtableError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<sqlx::Error> for RoundtableError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => RoundtableError::DatabasePoolUnavailable(err.to_string()),
            sqlx::Error::PoolClosed => {
                RoundtableError::DatabasePoolUnavailable("Connection pool is closed".to_string())
            }
            sqlx::Error::RowNotFound => {
                RoundtableError::DatabaseQueryFailed("Row not found".to_string())
            }
            sqlx::Error::Configuration(_) => {
                RoundtableError::database_connection_failed(err.to_string())
            }
            sqlx::Error::Database(db_err) => {
                RoundtableError::DatabaseQueryFailed(db_err.to_string())
            }
            _ => RoundtableError::DatabaseQueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for RoundtableError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RoundtableError::DatabaseMigrationFailed(err.to_string())
    }
}

impl From<reqwest::Error> for RoundtableError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RoundtableError::RequestTimeout(15)
        } else if err.is_connect() {
            RoundtableError::ApiServiceUnavailable(err.to_string())
        } else if err.is_status() {
            if let Some(status) = err.status() {
                if status.as_u16() == 429 {
                    return RoundtableError::ApiRateLimitExceeded {
                        service: err
                            .url()
                            .map(|u| u.host_str().unwrap_or("unknown").to_string())
                            .unwrap_or_else(|| "unknown".to_string()),
                        retry_after_secs: 60,
                    };
                } else if status.as_u16() == 401 || status.as_u16() == 403 {
                    return RoundtableError::ApiAuthenticationFailed {
                        service: err
                            .url()
                            .map(|u| u.host_str().unwrap_or("unknown").to_string())
                            .unwrap_or_else(|| "unknown".to_string()),
                        message: status.to_string(),
                    };
                }
            }
            RoundtableError::ApiRequestFailed(err.to_string())
        } else if err.is_decode() {
            RoundtableError::ApiParseError(err.to_string())
        } else {
            RoundtableError::ApiRequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RoundtableError {
    fn from(err: serde_json::Error) -> Self {
        RoundtableError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for RoundtableError {
    fn from(err: std::io::Error) -> Self {
        RoundtableError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for RoundtableError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => RoundtableError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => RoundtableError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => RoundtableError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => RoundtableError::ConfigParseError(err.to_string()),
        }
    }
}

impl From<crate::db::DatabaseError> for RoundtableError {
    fn from(err: crate::db::DatabaseError) -> Self {
        match err {
            crate::db::DatabaseError::ConnectionFailed(e) => {
                RoundtableError::database_connection_failed(e.to_string())
            }
            crate::db::DatabaseError::MigrationFailed(e) => {
                RoundtableError::DatabaseMigrationFailed(e.to_string())
            }
            crate::db::DatabaseError::InvalidConfig(msg) => RoundtableError::InvalidConfigValue {
                key: "database".to_string(),
                message: msg,
            },
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl RoundtableError {
    /// Returns true if this error is related to database operations.
    pub fn is_database_error(&self) -> bool {
        matches!(
            self,
            RoundtableError::DatabaseConnectionFailed { .. }
                | RoundtableError::DatabaseQueryFailed(_)
                | RoundtableError::DatabaseMigrationFailed(_)
                | RoundtableError::DatabasePoolUnavailable(_)
        )
    }

    /// Returns true if this error is related to configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RoundtableError::MissingEnvVar(_)
                | RoundtableError::InvalidEnvVar { .. }
                | RoundtableError::ConfigFileNotFound(_)
                | RoundtableError::ConfigParseError(_)
                | RoundtableError::InvalidConfigValue { .. }
                | RoundtableError::Config(_)
        )
    }

    /// Returns true if this error should be reported as a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RoundtableError::RoomNotFound(_) | RoundtableError::MemberNotFound(_)
        )
    }

    /// Returns true if this error was caused by bad caller input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RoundtableError::EmptyMessage
                | RoundtableError::NoRecipients
                | RoundtableError::UnknownEngine(_)
                | RoundtableError::InvalidRepoPath(_)
                | RoundtableError::InvalidNotionUrl
                | RoundtableError::MissingApiKey(_)
                | RoundtableError::NoReadableContent
                | RoundtableError::EmptyExtraction
                | RoundtableError::PdfExtractFailed(_)
                | RoundtableError::ValidationError(_)
        )
    }

    /// Returns true if this error came from fetching or parsing external content.
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            RoundtableError::ApiRequestFailed(_)
                | RoundtableError::ApiParseError(_)
                | RoundtableError::ApiRateLimitExceeded { .. }
                | RoundtableError::ApiAuthenticationFailed { .. }
                | RoundtableError::ApiServiceUnavailable(_)
                | RoundtableError::RequestTimeout(_)
                | RoundtableError::UrlFetchFailed(_)
                | RoundtableError::NoReadableContent
                | RoundtableError::EmptyExtraction
                | RoundtableError::PdfExtractFailed(_)
        )
    }

    /// Returns true if this error is transient and the operation might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RoundtableError::DatabasePoolUnavailable(_)
                | RoundtableError::DatabaseConnectionFailed { .. }
                | RoundtableError::ApiRateLimitExceeded { .. }
                | RoundtableError::ApiServiceUnavailable(_)
                | RoundtableError::RequestTimeout(_)
        )
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            RoundtableError::DatabaseConnectionFailed { .. } => "E1001",
            RoundtableError::DatabaseQueryFailed(_) => "E1002",
            RoundtableError::DatabaseMigrationFailed(_) => "E1003",
            RoundtableError::DatabasePoolUnavailable(_) => "E1004",
            RoundtableError::MissingEnvVar(_) => "E2001",
            RoundtableError::InvalidEnvVar { .. } => "E2002",
            RoundtableError::ConfigFileNotFound(_) => "E2003",
            RoundtableError::ConfigParseError(_) => "E2004",
            RoundtableError::InvalidConfigValue { .. } => "E2005",
            RoundtableError::Config(_) => "E2006",
            RoundtableError::RoomNotFound(_) => "E3001",
            RoundtableError::MemberNotFound(_) => "E3002",
            RoundtableError::UnknownEngine(_) => "E3003",
            RoundtableError::InvalidRepoPath(_) => "E3004",
            RoundtableError::EmptyMessage => "E4001",
            RoundtableError::NoRecipients => "E4002",
            RoundtableError::TurnTimeout { .. } => "E4003",
            RoundtableError::ApiRequestFailed(_) => "E5001",
            RoundtableError::ApiParseError(_) => "E5002",
            RoundtableError::ApiRateLimitExceeded { .. } => "E5003",
            RoundtableError::ApiAuthenticationFailed { .. } => "E5004",
            RoundtableError::ApiServiceUnavailable(_) => "E5005",
            RoundtableError::RequestTimeout(_) => "E5006",
            RoundtableError::UrlFetchFailed(_) => "E5007",
            RoundtableError::NoReadableContent => "E5008",
            RoundtableError::InvalidNotionUrl => "E5009",
            RoundtableError::MissingApiKey(_) => "E5010",
            RoundtableError::EmptyExtraction => "E5011",
            RoundtableError::PdfExtractFailed(_) => "E5012",
            RoundtableError::Internal(_) => "E9001",
            RoundtableError::ValidationError(_) => "E9002",
            RoundtableError::IoError(_) => "E9003",
            RoundtableError::SerializationError(_) => "E9004",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            RoundtableError::DatabaseConnectionFailed { .. } => {
                Some("Check that the database path is writable (ROUNDTABLE_DATABASE_PATH)")
            }
            RoundtableError::DatabasePoolUnavailable(_) => {
                Some("The database is busy. Try again in a few seconds")
            }
            RoundtableError::MissingEnvVar(_) => {
                Some("Create a .env file or set the environment variable")
            }
            RoundtableError::ConfigFileNotFound(_) => {
                Some("Run 'roundtable init' to create the configuration file")
            }
            RoundtableError::UnknownEngine(_) => {
                Some("Supported engines are claude, codex, and gemini")
            }
            RoundtableError::InvalidRepoPath(_) => {
                Some("Use an absolute path to a directory that exists on this machine")
            }
            RoundtableError::MissingApiKey(_) => {
                Some("Set ANTHROPIC_API_KEY in .env or configure a key per agent")
            }
            RoundtableError::ApiRateLimitExceeded { .. } => {
                Some("Wait for the rate limit to reset or use a different API key")
            }
            RoundtableError::ApiAuthenticationFailed { .. } => {
                Some("Check your API key in the configuration")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_transient() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Transient error occurred: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with suggestions.
pub struct CliErrorDisplay<'a> {
    error: &'a RoundtableError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a RoundtableError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message (already includes code)
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        if self.error.is_transient() {
            writeln!(f)?;
            writeln!(f, "  This error may be temporary. Try again shortly.")?;
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
