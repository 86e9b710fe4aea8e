use std::fmt;

/// Longest name the engine accepts for any object (`sysname`).
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Longest audit directory path accepted for embedding.
pub const MAX_PATH_LEN: usize = 260;

/// Errors that can occur during input validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    TooLong { max: usize, actual: usize },
    NullBytes,
    ControlCharacters,
    InvalidIdentifier(String),
    EmptyInput,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { max, actual } => {
                write!(f, "Input length {} exceeds maximum of {}", actual, max)
            }
            ValidationError::NullBytes => write!(f, "Input contains null bytes"),
            ValidationError::ControlCharacters => write!(f, "Input contains control characters"),
            ValidationError::InvalidIdentifier(reason) => {
                write!(f, "Invalid SQL identifier: {}", reason)
            }
            ValidationError::EmptyInput => write!(f, "Input must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '@' || c == '#'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$' | '-')
}

/// Validate that a database, schema or object name can be embedded in a
/// bracketed identifier.
///
/// Accepted names follow the engine's regular-identifier rules, with `-`
/// also allowed after the first character:
/// - Start with a letter, underscore, `@` or `#`
/// - Continue with letters, digits, `_`, `@`, `#`, `$` or `-`
/// - Are between 1 and 128 characters
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let len = name.chars().count();
    if len > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            max: MAX_IDENTIFIER_LEN,
            actual: len,
        });
    }

    if name.contains('\0') {
        return Err(ValidationError::NullBytes);
    }

    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !is_identifier_start(first) {
            return Err(ValidationError::InvalidIdentifier(format!(
                "'{}' must start with a letter, underscore, @ or #",
                name
            )));
        }
    }

    if !chars.all(is_identifier_part) {
        return Err(ValidationError::InvalidIdentifier(format!(
            "'{}' may only contain letters, digits, _, @, #, $ and -",
            name
        )));
    }

    Ok(())
}

/// Validate an audit directory path before it is embedded as a string literal.
pub fn validate_audit_path(path: &str) -> Result<(), ValidationError> {
    if path.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let len = path.chars().count();
    if len > MAX_PATH_LEN {
        return Err(ValidationError::TooLong {
            max: MAX_PATH_LEN,
            actual: len,
        });
    }

    if path.contains('\0') {
        return Err(ValidationError::NullBytes);
    }

    if path.chars().any(|c| c.is_control()) {
        return Err(ValidationError::ControlCharacters);
    }

    Ok(())
}

/// Wrap a validated name in brackets.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Render a value as an `N'...'` literal with embedded quotes doubled.
pub fn quote_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}
