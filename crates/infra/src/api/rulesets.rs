//! Rule set management
//!
//! Creation is plain JSON. Updates go out as multipart so replacement rule
//! documents can ride along with the text fields.

use std::sync::Arc;

use rcm_domain::constants::{
    ACTIVE_RULESET_PATH, MEDICAL_RULES_FIELD, RULESETS_PATH, TECHNICAL_RULES_FIELD,
};
use rcm_domain::{Listing, NewRuleSet, RuleSet, RuleSetChanges, RuleSetId};
use tracing::{debug, info, instrument};

use super::errors::ApiError;
use super::request::{ApiRequest, FormField};
use super::transport::AuthenticatedTransport;

/// Rule set management
#[derive(Clone)]
pub struct RuleSetsApi {
    transport: Arc<AuthenticatedTransport>,
}

impl RuleSetsApi {
    /// Client over a shared transport
    pub fn new(transport: Arc<AuthenticatedTransport>) -> Self {
        Self { transport }
    }

    /// `GET /rulesets/`
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Listing<RuleSet>, ApiError> {
        self.transport.send_json(ApiRequest::get(RULESETS_PATH)).await
    }

    /// `GET /rulesets/{id}/`
    #[instrument(skip(self))]
    pub async fn get(&self, id: RuleSetId) -> Result<RuleSet, ApiError> {
        self.transport.send_json(ApiRequest::get(item_path(id))).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the first field error when the
    /// backend refuses the values.
    #[instrument(skip(self, rule_set), fields(name = %rule_set.name))]
    pub async fn create(&self, rule_set: &NewRuleSet) -> Result<RuleSet, ApiError> {
        let created: RuleSet =
            self.transport.send_json(ApiRequest::post(RULESETS_PATH).json(rule_set)?).await?;
        info!(rule_set_id = created.id, "Rule set created");
        Ok(created)
    }

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` without contacting the server when
    /// `changes` is empty.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: RuleSetId, changes: &RuleSetChanges) -> Result<RuleSet, ApiError> {
        if changes.is_empty() {
            return Err(ApiError::Rejected { status: 400, message: "no changes to apply".into() });
        }

        let mut fields: Vec<FormField> = changes
            .text_fields()
            .into_iter()
            .map(|(name, value)| FormField::text(name, value))
            .collect();
        if let Some(file) = &changes.technical_rules_file {
            fields.push(FormField::file(TECHNICAL_RULES_FIELD, file.clone()));
        }
        if let Some(file) = &changes.medical_rules_file {
            fields.push(FormField::file(MEDICAL_RULES_FIELD, file.clone()));
        }

        let updated: RuleSet =
            self.transport.send_json(ApiRequest::patch(item_path(id)).multipart(fields)).await?;
        info!(rule_set_id = id, "Rule set updated");
        Ok(updated)
    }

    /// `DELETE /rulesets/{id}/`
    #[instrument(skip(self))]
    pub async fn delete(&self, id: RuleSetId) -> Result<(), ApiError> {
        self.transport.send_empty(ApiRequest::delete(item_path(id))).await?;
        info!(rule_set_id = id, "Rule set deleted");
        Ok(())
    }

    /// The rule set validation currently runs with, `None` if none is active
    #[instrument(skip(self))]
    pub async fn active(&self) -> Result<Option<RuleSet>, ApiError> {
        match self.transport.send_json(ApiRequest::get(ACTIVE_RULESET_PATH)).await {
            Ok(rule_set) => Ok(Some(rule_set)),
            Err(ApiError::NotFound(message)) => {
                debug!(%message, "No active rule set");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Make `id` the only active rule set
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: RuleSetId) -> Result<RuleSet, ApiError> {
        let rule_set: RuleSet = self
            .transport
            .send_json(ApiRequest::post(format!("{RULESETS_PATH}{id}/set_active/")))
            .await?;
        info!(rule_set_id = id, "Rule set activated");
        Ok(rule_set)
    }
}

fn item_path(id: RuleSetId) -> String {
    format!("{RULESETS_PATH}{id}/")
}
