//! Claim listing, statistics and revalidation

use anyhow::Result;
use clap::Args;
use rcm_domain::{ClaimFilter, ClaimStatus, ErrorType};
use rcm_infra::ApiClient;

use crate::output::{self, Output};

/// Filters for `rcm claims`
#[derive(Debug, Clone, Default, Args)]
pub struct ClaimFilterArgs {
    /// validated or not_validated
    #[arg(long)]
    pub status: Option<ClaimStatus>,

    /// no_error, medical_error, technical_error or both
    #[arg(long)]
    pub error_type: Option<ErrorType>,

    #[arg(long)]
    pub service_code: Option<String>,

    #[arg(long)]
    pub encounter_type: Option<String>,

    /// Free-text search over claim, member and national ids
    #[arg(long)]
    pub search: Option<String>,

    /// Sort field, prefix with `-` for descending (e.g. `-paid_amount_aed`)
    #[arg(long, allow_hyphen_values = true)]
    pub ordering: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,
}

impl From<ClaimFilterArgs> for ClaimFilter {
    fn from(args: ClaimFilterArgs) -> Self {
        Self {
            status: args.status,
            error_type: args.error_type,
            service_code: args.service_code,
            encounter_type: args.encounter_type,
            search: args.search,
            ordering: args.ordering,
            page: args.page,
        }
    }
}

pub async fn list(client: &ApiClient, out: Output, args: ClaimFilterArgs) -> Result<()> {
    let listing = client.claims().list(&args.into()).await?;
    out.emit(&listing, |listing| {
        let mut lines: Vec<String> = listing.items().iter().map(output::claim_line).collect();
        lines.push(format!(
            "{} of {} claims{}",
            listing.items().len(),
            listing.total(),
            if listing.has_next() { " (more pages)" } else { "" }
        ));
        lines.join("\n")
    })
}

pub async fn show(client: &ApiClient, out: Output, id: i64) -> Result<()> {
    let claim = client.claims().get(id).await?;
    out.emit(&claim, output::claim_detail)
}

pub async fn stats(client: &ApiClient, out: Output) -> Result<()> {
    let stats = client.claims().statistics().await?;
    out.emit(&stats, output::statistics)
}

pub async fn revalidate(client: &ApiClient, out: Output) -> Result<()> {
    let response = client.claims().revalidate().await?;
    out.emit(&response, |response| {
        let mut text = format!("{} ({} claims)", response.message, response.total);
        if let Some(task_id) = &response.task_id {
            text.push_str(&format!("\ntask: {task_id}"));
        }
        text
    })
}
