use serde::{Deserialize, Serialize};

use crate::security::validation::MAX_IDENTIFIER_LEN;
use crate::security::{quote_identifier, validate_identifier, ValidationError};

/// Prefix shared by every server audit this application creates.
pub const AUDIT_NAME_PREFIX: &str = "WCM_Audit";

/// Suffix appended to the audit name to form the specification name.
pub const SPEC_NAME_SUFFIX: &str = "_Spec";

/// One user object that is the subject of auditing.
///
/// Audit and specification names are derived from these three parts on every
/// call and never stored on their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTarget {
    pub database: String,
    pub schema_name: String,
    pub object_name: String,
}

impl AuditTarget {
    pub fn new(
        database: impl Into<String>,
        schema_name: impl Into<String>,
        object_name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema_name: schema_name.into(),
            object_name: object_name.into(),
        }
    }

    /// `WCM_Audit_{database}_{schema}_{object}`
    pub fn audit_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            AUDIT_NAME_PREFIX, self.database, self.schema_name, self.object_name
        )
    }

    /// `{audit_name}_Spec`
    pub fn spec_name(&self) -> String {
        format!("{}{}", self.audit_name(), SPEC_NAME_SUFFIX)
    }

    /// Check every part and both derived names before anything is embedded.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_identifier(&self.database)?;
        validate_identifier(&self.schema_name)?;
        validate_identifier(&self.object_name)?;

        // The spec name is the longer of the two derived names.
        let len = self.spec_name().chars().count();
        if len > MAX_IDENTIFIER_LEN {
            return Err(ValidationError::TooLong {
                max: MAX_IDENTIFIER_LEN,
                actual: len,
            });
        }
        Ok(())
    }

    /// `[database]`
    pub fn quoted_database(&self) -> String {
        quote_identifier(&self.database)
    }

    /// `[schema].[object]`
    pub fn quoted_object(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema_name),
            quote_identifier(&self.object_name)
        )
    }
}

impl std::fmt::Display for AuditTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema_name, self.object_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> AuditTarget {
        AuditTarget::new("Sales", "dbo", "Orders")
    }

    #[test]
    fn test_derived_names() {
        let target = orders();
        assert_eq!(target.audit_name(), "WCM_Audit_Sales_dbo_Orders");
        assert_eq!(target.spec_name(), "WCM_Audit_Sales_dbo_Orders_Spec");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = orders();
        let b = orders();
        assert_eq!(a.audit_name(), b.audit_name());
        assert_eq!(a.spec_name(), b.spec_name());
        assert!(a.spec_name().starts_with(&a.audit_name()));
    }

    #[test]
    fn test_distinct_targets_get_distinct_names() {
        let a = AuditTarget::new("Sales", "dbo", "Orders");
        let b = AuditTarget::new("Sales", "sales", "Orders");
        assert_ne!(a.audit_name(), b.audit_name());
    }

    #[test]
    fn test_quoting() {
        let target = orders();
        assert_eq!(target.quoted_database(), "[Sales]");
        assert_eq!(target.quoted_object(), "[dbo].[Orders]");
        assert_eq!(target.to_string(), "Sales.dbo.Orders");
    }

    #[test]
    fn test_validate_accepts_plain_names() {
        assert!(orders().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unsafe_part() {
        let target = AuditTarget::new("Sales", "dbo", "Orders]; DROP LOGIN sa; --");
        assert!(matches!(
            target.validate(),
            Err(ValidationError::InvalidIdentifier(_))
        ));

        let target = AuditTarget::new("", "dbo", "Orders");
        assert_eq!(target.validate(), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn test_validate_rejects_overlong_derived_name() {
        // Each part is legal on its own; the derived spec name is not.
        let target = AuditTarget::new("d".repeat(40), "s".repeat(40), "o".repeat(40));
        assert!(matches!(
            target.validate(),
            Err(ValidationError::TooLong { max: 128, .. })
        ));
    }

    #[test]
    fn test_deserializes_from_camel_case() {
        let target: AuditTarget = serde_json::from_str(
            r#"{"database":"Sales","schemaName":"dbo","objectName":"Orders"}"#,
        )
        .unwrap();
        assert_eq!(target, orders());
    }
}
