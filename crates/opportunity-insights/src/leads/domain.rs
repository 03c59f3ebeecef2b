use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a stored lead. Ids are issued in strictly increasing order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    /// Numeric sequence value behind the id, when it has one.
    pub fn sequence(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Form payload posted by the lead capture form.
///
/// Every field is optional on the wire so that a missing value surfaces as a
/// validation failure instead of a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Required submission fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    Name,
    Email,
    Phone,
}

impl LeadField {
    pub fn label(&self) -> &'static str {
        match self {
            LeadField::Name => "name",
            LeadField::Email => "email",
            LeadField::Phone => "phone",
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Submission with its required fields confirmed present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedLead {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) product: String,
    pub(crate) country: String,
}

impl LeadSubmission {
    /// Presence check only; format rules belong to the form.
    pub(crate) fn validate(self) -> Result<ValidatedLead, LeadField> {
        let name = required(self.name, LeadField::Name)?;
        let email = required(self.email, LeadField::Email)?;
        let phone = required(self.phone, LeadField::Phone)?;
        let phone = match self.country_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => format!("{code} {phone}"),
            _ => phone,
        };

        Ok(ValidatedLead {
            name,
            email,
            phone,
            product: self.product.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
        })
    }
}

fn required(value: Option<String>, field: LeadField) -> Result<String, LeadField> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(field),
    }
}

/// A stored contact record. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub id: LeadId,
    pub submitted_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub product: String,
    pub country_of_interest: String,
}

impl LeadRecord {
    /// Whether this record shares the `(email, product)` dedup key.
    pub fn same_key(&self, email: &str, product: &str) -> bool {
        self.email == email && self.product == product
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> LeadSubmission {
        LeadSubmission {
            name: Some("Jane Doe".to_string()),
            email: Some("jane@co.com".to_string()),
            phone: Some("9876543210".to_string()),
            country_code: Some("+91".to_string()),
            product: Some("Yoga Mat".to_string()),
            country: Some("usa".to_string()),
        }
    }

    #[test]
    fn validate_formats_phone_with_country_code() {
        let lead = submission().validate().expect("valid submission");
        assert_eq!(lead.phone, "+91 9876543210");
        assert_eq!(lead.country, "usa");
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let mut missing_email = submission();
        missing_email.email = None;
        assert_eq!(missing_email.validate(), Err(LeadField::Email));

        let mut blank_name = submission();
        blank_name.name = Some("   ".to_string());
        assert_eq!(blank_name.validate(), Err(LeadField::Name));
    }

    #[test]
    fn submission_reads_camel_case_json() {
        let parsed: LeadSubmission = serde_json::from_str(
            r#"{"name":"A","email":"a@x.com","phone":"1","countryCode":"+1","product":"P1"}"#,
        )
        .expect("json parses");
        assert_eq!(parsed.country_code.as_deref(), Some("+1"));
        assert_eq!(parsed.country, None);
    }

    #[test]
    fn record_serializes_camel_case_fields() {
        let record = LeadRecord {
            id: LeadId("1760000000000".to_string()),
            submitted_at: DateTime::parse_from_rfc3339("2025-10-09T08:53:20Z")
                .expect("timestamp")
                .with_timezone(&Utc),
            name: "Jane Doe".to_string(),
            email: "jane@co.com".to_string(),
            phone: "+91 9876543210".to_string(),
            product: "Yoga Mat".to_string(),
            country_of_interest: "usa".to_string(),
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["id"], "1760000000000");
        assert_eq!(value["countryOfInterest"], "usa");
        assert!(value["submittedAt"].as_str().is_some());
        assert_eq!(record.id.sequence(), Some(1_760_000_000_000));
    }
}
