//! Claim records and aggregate statistics

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_wire_enum;

/// Outcome of validating a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Validated,
    NotValidated,
}

impl_wire_enum!(ClaimStatus {
    Validated => "validated",
    NotValidated => "not_validated",
});

/// Error classification assigned by the validation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    NoError,
    MedicalError,
    TechnicalError,
    Both,
}

impl_wire_enum!(ErrorType {
    NoError => "no_error",
    MedicalError => "medical_error",
    TechnicalError => "technical_error",
    Both => "both",
});

/// One validated claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    pub claim_id: String,
    #[serde(default)]
    pub encounter_type: String,
    #[serde(default)]
    pub service_date: Option<NaiveDate>,
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub member_id: String,
    #[serde(default)]
    pub facility_id: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub diagnosis_codes: String,
    #[serde(default)]
    pub service_code: String,
    #[serde(with = "crate::types::decimal_serde")]
    pub paid_amount_aed: f64,
    #[serde(default)]
    pub approval_number: Option<String>,
    pub status: ClaimStatus,
    pub error_type: ErrorType,
    #[serde(default)]
    pub error_explanation: String,
    #[serde(default)]
    pub recommended_action: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Claim {
    /// Diagnosis codes split on commas, trimmed, empties dropped
    pub fn diagnosis_code_list(&self) -> Vec<&str> {
        self.diagnosis_codes.split(',').map(str::trim).filter(|code| !code.is_empty()).collect()
    }
}

/// Query filters accepted by `GET /claims/`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub error_type: Option<ErrorType>,
    pub service_code: Option<String>,
    pub encounter_type: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
}

impl ClaimFilter {
    /// Query pairs in a stable order, unset filters omitted
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(error_type) = self.error_type {
            query.push(("error_type", error_type.as_str().to_string()));
        }
        let text_filters = [
            ("service_code", &self.service_code),
            ("encounter_type", &self.encounter_type),
            ("search", &self.search),
            ("ordering", &self.ordering),
        ];
        for (key, value) in text_filters {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query.push((key, value.to_string()));
            }
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        query
    }
}

/// Paginated list envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// List endpoints answer either with a page envelope or a bare array,
/// depending on the backend's pagination settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    /// Records on this page
    pub fn items(&self) -> &[T] {
        match self {
            Self::Paged(page) => &page.results,
            Self::Plain(items) => items,
        }
    }

    /// Total number of matching records on the server
    pub fn total(&self) -> u64 {
        match self {
            Self::Paged(page) => page.count,
            Self::Plain(items) => items.len() as u64,
        }
    }

    /// Whether the backend reported a further page
    pub fn has_next(&self) -> bool {
        matches!(self, Self::Paged(Page { next: Some(_), .. }))
    }

    /// Take the records, dropping pagination details
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paged(page) => page.results,
            Self::Plain(items) => items,
        }
    }
}

/// Per error type breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBreakdown<T> {
    pub no_error: T,
    pub medical_error: T,
    pub technical_error: T,
    pub both: T,
}

impl<T: Copy> ErrorBreakdown<T> {
    /// Value for one error type
    pub fn get(&self, error_type: ErrorType) -> T {
        match error_type {
            ErrorType::NoError => self.no_error,
            ErrorType::MedicalError => self.medical_error,
            ErrorType::TechnicalError => self.technical_error,
            ErrorType::Both => self.both,
        }
    }
}

/// Body of `GET /claims/statistics/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_claims: u64,
    #[serde(default)]
    pub validated: u64,
    #[serde(default)]
    pub not_validated: u64,
    #[serde(default)]
    pub error_type_counts: ErrorBreakdown<u64>,
    #[serde(default)]
    pub paid_amount_by_error: ErrorBreakdown<f64>,
    #[serde(default)]
    pub validation_rate: Option<f64>,
    /// Which backend table produced the figures
    #[serde(default)]
    pub source: Option<String>,
}

/// Body of `POST /claims/revalidate/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidationResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub processed: Option<u64>,
    #[serde(default)]
    pub validated: Option<u64>,
    #[serde(default)]
    pub errors: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_json() -> &'static str {
        r#"{
            "id": 1, "claim_id": "C-100", "encounter_type": "INPATIENT",
            "service_date": "2024-03-01", "national_id": "N1", "member_id": "M1",
            "facility_id": "F1", "unique_id": "U1", "diagnosis_codes": "E11.9, I10,",
            "service_code": "SRV1001", "paid_amount_aed": "1250.50",
            "approval_number": null, "status": "not_validated",
            "error_type": "technical_error", "error_explanation": "Missing approval",
            "recommended_action": "Obtain approval",
            "created_at": "2024-03-02T10:00:00Z", "updated_at": "2024-03-02T10:00:00Z"
        }"#
    }

    #[test]
    fn parses_claim_with_decimal_string() {
        let claim: Claim = serde_json::from_str(claim_json()).unwrap();
        assert!((claim.paid_amount_aed - 1250.5).abs() < f64::EPSILON);
        assert_eq!(claim.error_type, ErrorType::TechnicalError);
        assert_eq!(claim.diagnosis_code_list(), vec!["E11.9", "I10"]);
    }

    #[test]
    fn listing_accepts_both_shapes() {
        let paged: Listing<Claim> = serde_json::from_str(&format!(
            r#"{{"count": 31, "next": "http://x/claims/?page=2", "previous": null, "results": [{}]}}"#,
            claim_json()
        ))
        .unwrap();
        assert_eq!(paged.total(), 31);
        assert!(paged.has_next());
        assert_eq!(paged.items().len(), 1);

        let plain: Listing<Claim> =
            serde_json::from_str(&format!("[{}, {}]", claim_json(), claim_json())).unwrap();
        assert_eq!(plain.total(), 2);
        assert!(!plain.has_next());
    }

    #[test]
    fn filter_query_skips_unset_fields() {
        let filter = ClaimFilter {
            status: Some(ClaimStatus::NotValidated),
            error_type: Some(ErrorType::Both),
            search: Some(String::new()),
            page: Some(2),
            ..ClaimFilter::default()
        };

        assert_eq!(
            filter.to_query(),
            vec![
                ("status", "not_validated".to_string()),
                ("error_type", "both".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }

    #[test]
    fn statistics_breakdown_lookup() {
        let stats: Statistics = serde_json::from_str(
            r#"{"total_claims": 10, "validated": 6, "not_validated": 4,
                "error_type_counts": {"no_error": 6, "medical_error": 1, "technical_error": 2, "both": 1},
                "paid_amount_by_error": {"no_error": 100.0, "medical_error": 5.5},
                "validation_rate": 60.0, "source": "metrics_table"}"#,
        )
        .unwrap();

        assert_eq!(stats.error_type_counts.get(ErrorType::TechnicalError), 2);
        assert!(stats.paid_amount_by_error.get(ErrorType::Both).abs() < f64::EPSILON);
        assert_eq!(stats.source.as_deref(), Some("metrics_table"));
    }
}
