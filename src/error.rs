use std::fmt;

use thiserror::Error;

/// Coarse classification of a [`ConfigError`], for callers that only need
/// to know which rule rejected a declaration or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Metadata,
    Type,
    Domain,
    Range,
    Required,
    Validation,
    UnknownKey,
    Transaction,
    SchemaDocument,
    Cli,
}

/// Common base error for schema compilation, value validation, transactions
/// and the CLI adapter.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid metadata for '{field}': {reason}")]
    Metadata { field: String, reason: String },

    #[error("Type error for '{field}': {reason}")]
    Type { field: String, reason: String },

    #[error("Domain error for '{field}': {reason}")]
    Domain { field: String, reason: String },

    #[error("Value for '{field}' out of range: {reason}")]
    Range { field: String, reason: String },

    #[error("Invalid 'required' declaration for '{field}': {reason}")]
    Required { field: String, reason: String },

    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Key not found: {0}")]
    UnknownKey(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Failed to parse schema document: {0}")]
    SchemaDocument(#[from] toml::de::Error),

    #[error("Unknown key '{key}' in schema document (line {line})")]
    UnknownSchemaKey { key: String, line: usize },

    #[error("Unknown keys in schema document")]
    UnknownSchemaKeys(Vec<ConfigError>),

    #[cfg(feature = "clap")]
    #[error("Command line error: {0}")]
    Cli(#[from] clap::Error),
}

impl ConfigError {
    pub fn metadata(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Metadata {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn type_error(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Type {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn domain(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn required(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Required {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The error custom validators are expected to return.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Metadata { .. } => ErrorKind::Metadata,
            Self::Type { .. } => ErrorKind::Type,
            Self::Domain { .. } => ErrorKind::Domain,
            Self::Range { .. } => ErrorKind::Range,
            Self::Required { .. } => ErrorKind::Required,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::UnknownKey(_) => ErrorKind::UnknownKey,
            Self::Transaction(_) => ErrorKind::Transaction,
            Self::SchemaDocument(_) | Self::UnknownSchemaKey { .. } | Self::UnknownSchemaKeys(_) => {
                ErrorKind::SchemaDocument
            }
            #[cfg(feature = "clap")]
            Self::Cli(_) => ErrorKind::Cli,
        }
    }
}

/// Which kind of derived attribute a rejected write targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedKind {
    Computed,
    Inverted,
}

impl fmt::Display for DerivedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedKind::Computed => write!(f, "computed"),
            DerivedKind::Inverted => write!(f, "auto-inverted"),
        }
    }
}

/// A write to a computed or auto-inverted attribute.
///
/// Not a [`ConfigError`]: no value was validated, the attribute has no
/// storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Can't set attribute '{name}': {kind} attributes are read-only")]
pub struct ReadOnlyError {
    pub name: String,
    pub kind: DerivedKind,
}

/// Failure of [`Config::set`](crate::Config::set).
#[derive(Debug, Error)]
pub enum SetError {
    #[error(transparent)]
    ReadOnly(#[from] ReadOnlyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SetError {
    /// The configuration-error kind, or `None` for a read-only violation.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SetError::ReadOnly(_) => None,
            SetError::Config(e) => Some(e.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_error_formats_correctly() {
        let err = ConfigError::range("timeout", "9999 is not within [1, 120]");
        let msg = err.to_string();
        assert!(msg.contains("timeout"));
        assert!(msg.contains("9999"));
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn unknown_key_formats() {
        let err = ConfigError::UnknownKey("colour".into());
        assert!(err.to_string().contains("colour"));
        assert_eq!(err.kind(), ErrorKind::UnknownKey);
    }

    #[test]
    fn read_only_error_is_not_a_config_error() {
        let err: SetError = ReadOnlyError {
            name: "spaces".into(),
            kind: DerivedKind::Computed,
        }
        .into();
        assert_eq!(err.kind(), None);
        assert!(err.to_string().contains("computed"));
    }

    #[test]
    fn set_error_exposes_config_kind() {
        let err: SetError = ConfigError::validation("port", "not permitted").into();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }
}
