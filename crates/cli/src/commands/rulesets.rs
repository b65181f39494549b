//! Rule set management commands

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;
use rcm_domain::{NewRuleSet, RuleSetChanges, RuleSetId};
use rcm_infra::api::read_upload;
use rcm_infra::ApiClient;

use crate::output::{self, Output};

#[derive(Debug, Clone, Subcommand)]
pub enum RuleSetCommand {
    /// List rule sets; the active one is marked with `*`
    List,

    /// Show the active rule set
    Active,

    /// Show one rule set
    Show { id: RuleSetId },

    /// Create a rule set (upload documents afterwards with `update`)
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Paid amount (AED) above which prior approval is required
        #[arg(long)]
        threshold: Option<f64>,
        /// Activate immediately
        #[arg(long)]
        active: bool,
    },

    /// Change fields or replace rule documents
    Update {
        id: RuleSetId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Paid amount threshold, sent exactly as typed
        #[arg(long)]
        threshold: Option<String>,
        #[arg(long)]
        technical_rules: Option<PathBuf>,
        #[arg(long)]
        medical_rules: Option<PathBuf>,
    },

    /// Make a rule set the only active one
    SetActive { id: RuleSetId },

    Delete { id: RuleSetId },
}

pub async fn handle_rule_set_command(
    client: &ApiClient,
    out: Output,
    command: RuleSetCommand,
) -> Result<()> {
    let api = client.rulesets();

    match command {
        RuleSetCommand::List => {
            let listing = api.list().await?;
            out.emit(&listing, |listing| {
                if listing.items().is_empty() {
                    return "No rule sets".to_string();
                }
                listing.items().iter().map(output::rule_set_line).collect::<Vec<_>>().join("\n")
            })
        }
        RuleSetCommand::Active => {
            let active = api.active().await?;
            out.emit(&active, |active| match active {
                Some(rule_set) => output::rule_set_detail(rule_set),
                None => "No active rule set".to_string(),
            })
        }
        RuleSetCommand::Show { id } => out.emit(&api.get(id).await?, output::rule_set_detail),
        RuleSetCommand::Create { name, description, threshold, active } => {
            let request = NewRuleSet {
                name,
                description,
                is_active: active.then_some(true),
                paid_amount_threshold: threshold,
            };
            let created = api.create(&request).await?;
            out.emit(&created, |rule_set| format!("Created\n{}", output::rule_set_line(rule_set)))
        }
        RuleSetCommand::Update { id, name, description, threshold, technical_rules, medical_rules } => {
            let mut changes = RuleSetChanges {
                name,
                description,
                paid_amount_threshold: threshold,
                ..RuleSetChanges::default()
            };
            if let Some(path) = technical_rules {
                changes.technical_rules_file = Some(read_upload(&path).await?);
            }
            if let Some(path) = medical_rules {
                changes.medical_rules_file = Some(read_upload(&path).await?);
            }
            if changes.is_empty() {
                bail!("nothing to update; pass at least one field or document");
            }
            let updated = api.update(id, &changes).await?;
            out.emit(&updated, |rule_set| format!("Updated\n{}", output::rule_set_detail(rule_set)))
        }
        RuleSetCommand::SetActive { id } => {
            let rule_set = api.set_active(id).await?;
            out.emit(&rule_set, |rule_set| format!("Activated\n{}", output::rule_set_line(rule_set)))
        }
        RuleSetCommand::Delete { id } => {
            api.delete(id).await?;
            out.message(&format!("Deleted rule set #{id}"));
            Ok(())
        }
    }
}
