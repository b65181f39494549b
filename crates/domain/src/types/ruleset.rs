//! Rule set records
//!
//! A rule set bundles the technical and medical rule documents with the paid
//! amount threshold. At most one rule set is active on the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::upload::UploadFile;

/// Backend primary key of a rule set
pub type RuleSetId = i64;

/// Rule set record as served by `/rulesets/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: RuleSetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub technical_rules_file: Option<String>,
    #[serde(default)]
    pub medical_rules_file: Option<String>,
    #[serde(default)]
    pub technical_rules_file_url: Option<String>,
    #[serde(default)]
    pub medical_rules_file_url: Option<String>,
    #[serde(with = "crate::types::decimal_serde")]
    pub paid_amount_threshold: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// JSON body of `POST /rulesets/`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewRuleSet {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount_threshold: Option<f64>,
}

/// Partial update sent as multipart to `PATCH /rulesets/{id}/`
///
/// Unset fields are left untouched on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSetChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    /// Kept as text so the decimal reaches the backend exactly as typed
    pub paid_amount_threshold: Option<String>,
    pub technical_rules_file: Option<UploadFile>,
    pub medical_rules_file: Option<UploadFile>,
}

impl RuleSetChanges {
    /// Whether nothing would be changed
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Text fields in the order they are appended to the form
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("name", name.clone()));
        }
        if let Some(description) = &self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(is_active) = self.is_active {
            fields.push(("is_active", is_active.to_string()));
        }
        if let Some(threshold) = &self.paid_amount_threshold {
            fields.push(("paid_amount_threshold", threshold.clone()));
        }
        fields
    }
}
