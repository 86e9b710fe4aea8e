pub mod validation;

pub use validation::{
    quote_identifier, quote_literal, validate_audit_path, validate_identifier, ValidationError,
};
