//! Blank import templates.
//!
//! A template is the header line of an import file: exactly the fields the
//! validator inspects for that entity kind, in schema order.

use crate::models::EntityKind;
use crate::parser::header_line;
use crate::validation::rules::schema;

/// Column names of the import template for `kind`.
pub fn template_columns(kind: EntityKind) -> Vec<&'static str> {
    schema(kind).iter().map(|f| f.name).collect()
}

/// Header-only CSV for `kind`, with a trailing newline.
///
/// ```
/// use pharmplus_bulk::{import_template, EntityKind};
///
/// let template = import_template(EntityKind::Claims);
/// assert!(template.starts_with("\"membershipNumber\",\"type\""));
/// assert!(template.ends_with('\n'));
/// ```
pub fn import_template(kind: EntityKind) -> String {
    header_line(&template_columns(kind))
}

/// Suggested download name, e.g. `members_import_template.csv`.
pub fn template_file_name(kind: EntityKind) -> String {
    format!("{}_import_template.csv", kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_headers;

    #[test]
    fn test_member_template() {
        assert_eq!(
            import_template(EntityKind::Members),
            "\"firstName\",\"surname\",\"email\",\"phone\",\"idNumber\",\"dateOfBirth\",\"address\",\"packageId\",\"notes\"\n"
        );
    }

    #[test]
    fn test_claims_template() {
        let template = import_template(EntityKind::Claims);
        for col in ["membershipNumber", "type", "provider", "serviceDate", "amount"] {
            assert!(template.contains(col));
        }
    }

    #[test]
    fn test_transactions_template() {
        let template = import_template(EntityKind::Transactions);
        for col in ["membershipNumber", "type", "method", "amount", "currency"] {
            assert!(template.contains(col));
        }
    }

    #[test]
    fn test_template_is_header_only() {
        for kind in EntityKind::ALL {
            let template = import_template(kind);
            assert!(template.ends_with('\n'));
            assert_eq!(template.lines().count(), 1);
            assert_eq!(parse_headers(&template, ','), template_columns(kind));
        }
    }

    #[test]
    fn test_template_file_name() {
        assert_eq!(template_file_name(EntityKind::Claims), "claims_import_template.csv");
    }
}
