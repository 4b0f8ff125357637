//! # Error Handling
//!
//! This module provides the error type for Courier Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Core Errors                                                       │
//! │  │   ├── NotInitialized        - Core not initialized                  │
//! │  │   └── AlreadyInitialized    - Core already initialized              │
//! │  │                                                                      │
//! │  ├── Identity Errors                                                   │
//! │  │   └── IdentityUnavailable   - Local key pair missing (FATAL)        │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── InvalidKeyFormat      - Key text malformed or key invalid     │
//! │  │   ├── EncryptionFailure     - Scheme rejected the plaintext         │
//! │  │   └── DecryptionFailure     - Malformed, tampered or wrong key      │
//! │  │                                                                      │
//! │  ├── Registry Errors                                                   │
//! │  │   ├── DuplicateIdentifier   - Identifier already registered         │
//! │  │   ├── InvalidIdentifier     - Empty / blank identifier              │
//! │  │   └── PartyNotFound         - No party with that identifier         │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── InvalidConfig         - Configuration rejected                │
//! │      ├── SerializationError                                            │
//! │      └── DeserializationError                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## UI Boundary
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR HANDLING FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Core (Rust)                  UI Boundary               Presentation   │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  ErrorReport  ──────────────►  dialog        │
//! │                             (code, message,               highlighting │
//! │                              field, fatal)                the field    │
//! │                                                                         │
//! │  Example:                                                              │
//! │  Err(Error::InvalidKeyFormat(..)) → { code: 300, field: "public_key" } │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in the core retries. Every failure except
//! [`Error::IdentityUnavailable`] is recovered by the caller supplying
//! corrected input.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Courier Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Courier Core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Core Lifecycle Errors (100-199)
    // ========================================================================
    /// Core has not been initialized
    #[error("Courier Core has not been initialized. Call CourierCore::initialize() first.")]
    NotInitialized,

    /// Core has already been initialized
    #[error("Courier Core has already been initialized.")]
    AlreadyInitialized,

    // ========================================================================
    // Identity Errors (200-299)
    // ========================================================================
    /// The local key pair could not be loaded or generated
    #[error("Local identity unavailable: {0}")]
    IdentityUnavailable(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================
    /// Public key text is malformed or decodes to an unusable key
    #[error("Invalid public key: {0}")]
    InvalidKeyFormat(String),

    /// The recipient key is usable but the scheme rejected this operation
    #[error("Encryption failed: {0}")]
    EncryptionFailure(String),

    /// Ciphertext is malformed, was tampered with, or is not for this key.
    ///
    /// Carries no detail so that every decryption failure looks the same.
    #[error("Decryption failed: the message could not be decrypted with the local key")]
    DecryptionFailure,

    // ========================================================================
    // Registry Errors (600-699)
    // ========================================================================
    /// A party with this identifier already exists
    #[error("A party named '{0}' already exists.")]
    DuplicateIdentifier(String),

    /// The identifier is empty or blank
    #[error("Invalid party identifier: {0}")]
    InvalidIdentifier(String),

    /// No party is registered under this identifier
    #[error("No party named '{0}'.")]
    PartyNotFound(String),

    // ========================================================================
    // Internal Errors (800-999)
    // ========================================================================
    /// Configuration value rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

/// The user-supplied input an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    /// Party identifier (name)
    Identifier,
    /// Public key text
    PublicKey,
    /// Message to encrypt
    Plaintext,
    /// Message to decrypt
    Ciphertext,
    /// The local identity (not correctable by the user)
    Identity,
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Core lifecycle
    /// - 200-299: Identity
    /// - 300-399: Crypto
    /// - 600-699: Registry
    /// - 800-999: Configuration / internal
    pub fn code(&self) -> i32 {
        match self {
            Error::NotInitialized => 100,
            Error::AlreadyInitialized => 101,

            Error::IdentityUnavailable(_) => 200,

            Error::InvalidKeyFormat(_) => 300,
            Error::EncryptionFailure(_) => 301,
            Error::DecryptionFailure => 302,

            Error::DuplicateIdentifier(_) => 600,
            Error::InvalidIdentifier(_) => 601,
            Error::PartyNotFound(_) => 602,

            Error::InvalidConfig(_) => 800,
            Error::SerializationError(_) => 900,
            Error::DeserializationError(_) => 901,
        }
    }

    /// Whether the process cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::IdentityUnavailable(_))
    }

    /// Check if this error is resolved by the user correcting an input
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::InvalidKeyFormat(_)
                | Error::EncryptionFailure(_)
                | Error::DecryptionFailure
                | Error::DuplicateIdentifier(_)
                | Error::InvalidIdentifier(_)
                | Error::PartyNotFound(_)
        )
    }

    /// Which input the UI should point the user at
    pub fn field(&self) -> Option<InputField> {
        match self {
            Error::IdentityUnavailable(_) => Some(InputField::Identity),
            Error::InvalidKeyFormat(_) => Some(InputField::PublicKey),
            Error::EncryptionFailure(_) => Some(InputField::Plaintext),
            Error::DecryptionFailure => Some(InputField::Ciphertext),
            Error::DuplicateIdentifier(_)
            | Error::InvalidIdentifier(_)
            | Error::PartyNotFound(_) => Some(InputField::Identifier),
            _ => None,
        }
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::DeserializationError(err.to_string())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

// ============================================================================
// UI ERROR REPRESENTATION
// ============================================================================

/// Serializable error representation handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// The input the user should correct, if any
    pub field: Option<InputField>,
    /// Whether the application must stop
    pub fatal: bool,
}

impl From<Error> for ErrorReport {
    fn from(err: Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            field: err.field(),
            fatal: err.is_fatal(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotInitialized.code(), 100);
        assert_eq!(Error::IdentityUnavailable("x".into()).code(), 200);
        assert_eq!(Error::InvalidKeyFormat("x".into()).code(), 300);
        assert_eq!(Error::DecryptionFailure.code(), 302);
        assert_eq!(Error::DuplicateIdentifier("alice".into()).code(), 600);
        assert_eq!(Error::DeserializationError("x".into()).code(), 901);
    }

    #[test]
    fn test_only_identity_is_fatal() {
        assert!(Error::IdentityUnavailable("no keystore".into()).is_fatal());
        assert!(!Error::DecryptionFailure.is_fatal());
        assert!(!Error::InvalidKeyFormat("bad".into()).is_fatal());
        assert!(!Error::DuplicateIdentifier("alice".into()).is_fatal());
    }

    #[test]
    fn test_fields_distinguish_user_inputs() {
        assert_eq!(
            Error::InvalidKeyFormat("bad".into()).field(),
            Some(InputField::PublicKey)
        );
        assert_eq!(Error::DecryptionFailure.field(), Some(InputField::Ciphertext));
        assert_eq!(
            Error::DuplicateIdentifier("alice".into()).field(),
            Some(InputField::Identifier)
        );
        assert_eq!(Error::NotInitialized.field(), None);
    }

    #[test]
    fn test_error_report_conversion() {
        let report: ErrorReport = Error::DuplicateIdentifier("alice".into()).into();

        assert_eq!(report.code, 600);
        assert!(report.message.contains("alice"));
        assert_eq!(report.field, Some(InputField::Identifier));
        assert!(!report.fatal);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"field\":\"identifier\""));
    }

    #[test]
    fn test_json_errors_map_to_deserialization() {
        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }
}
