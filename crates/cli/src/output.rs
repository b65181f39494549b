//! Rendering of command results
//!
//! Every command prints either human-readable text or, with `--json`, the
//! backend record as pretty JSON. Progress and notices go to stderr.

use std::fmt::Write as _;

use rcm_domain::{Claim, Job, JobStatusReport, RuleSet, Statistics};
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or the text produced by `human`
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
        let text = if self.json { serde_json::to_string_pretty(value)? } else { human(value) };
        println!("{}", text.trim_end());
        Ok(())
    }

    pub fn message(&self, text: &str) {
        if !self.json {
            println!("{text}");
        }
    }
}

pub fn job_line(job: &Job) -> String {
    let progress = job.progress();
    let mut line = format!(
        "#{:<5} {:<10} {:>5}/{:<5} {:>5.1}%",
        job.id, job.status, progress.processed, progress.total, progress.percentage
    );
    if let Some(file) = &job.claims_file {
        let _ = write!(line, "  {file}");
    }
    if let Some(message) = &job.error_message {
        let _ = write!(line, "  ({message})");
    }
    line
}

pub fn job_detail(job: &Job) -> String {
    let mut text = job_line(job);
    let _ = write!(text, "\nvalidated: {}  errors: {}", job.validated_count, job.error_count);
    if let Some(done) = job.completed_at {
        let _ = write!(text, "\ncompleted: {done}");
    }
    text
}

pub fn report_line(report: &JobStatusReport) -> String {
    let progress = &report.progress;
    let mut line = format!(
        "{} {}/{} ({:.1}%)",
        report.status, progress.processed, progress.total, progress.percentage
    );
    if let (Some(validated), Some(errors)) = (progress.validated, progress.errors) {
        let _ = write!(line, " validated: {validated} errors: {errors}");
    }
    line
}

pub fn claim_line(claim: &Claim) -> String {
    format!(
        "{:<12} {:<14} {:<16} {:>12.2} AED  {}",
        claim.claim_id, claim.status, claim.error_type, claim.paid_amount_aed, claim.service_code
    )
}

pub fn claim_detail(claim: &Claim) -> String {
    let mut text = claim_line(claim);
    let _ = write!(
        text,
        "\nencounter: {}  member: {}  facility: {}\ndiagnoses: {}",
        claim.encounter_type,
        claim.member_id,
        claim.facility_id,
        claim.diagnosis_code_list().join(", ")
    );
    if !claim.error_explanation.is_empty() {
        let _ = write!(text, "\nerror: {}", claim.error_explanation);
    }
    if !claim.recommended_action.is_empty() {
        let _ = write!(text, "\naction: {}", claim.recommended_action);
    }
    text
}

pub fn statistics(stats: &Statistics) -> String {
    let counts = &stats.error_type_counts;
    let paid = &stats.paid_amount_by_error;
    let mut text = format!(
        "claims: {}  validated: {}  not validated: {}",
        stats.total_claims, stats.validated, stats.not_validated
    );
    if let Some(rate) = stats.validation_rate {
        let _ = write!(text, "  rate: {rate:.1}%");
    }
    for (label, count, amount) in [
        ("no error", counts.no_error, paid.no_error),
        ("medical", counts.medical_error, paid.medical_error),
        ("technical", counts.technical_error, paid.technical_error),
        ("both", counts.both, paid.both),
    ] {
        let _ = write!(text, "\n  {label:<10} {count:>6}  {amount:>14.2} AED");
    }
    text
}

pub fn rule_set_line(rule_set: &RuleSet) -> String {
    format!(
        "#{:<4} {} {:<24} threshold {:.2} AED",
        rule_set.id,
        if rule_set.is_active { "*" } else { " " },
        rule_set.name,
        rule_set.paid_amount_threshold
    )
}

pub fn rule_set_detail(rule_set: &RuleSet) -> String {
    let mut text = rule_set_line(rule_set);
    if !rule_set.description.is_empty() {
        let _ = write!(text, "\n{}", rule_set.description);
    }
    for (label, file) in [
        ("technical rules", &rule_set.technical_rules_file),
        ("medical rules", &rule_set.medical_rules_file),
    ] {
        let _ = write!(text, "\n{label}: {}", file.as_deref().unwrap_or("-"));
    }
    text
}

#[cfg(test)]
mod tests {
    use rcm_domain::{ClaimStatus, ErrorType, JobProgress, JobStatus};

    use super::*;

    #[test]
    fn report_line_includes_outcome_counts() {
        let report = JobStatusReport {
            job_id: None,
            status: JobStatus::Processing,
            progress: JobProgress {
                processed: 50,
                total: 200,
                percentage: 25.0,
                validated: Some(40),
                errors: Some(10),
            },
            error_message: None,
        };

        assert_eq!(report_line(&report), "processing 50/200 (25.0%) validated: 40 errors: 10");
    }

    #[test]
    fn claim_line_shows_wire_names() {
        let claim: Claim = serde_json::from_value(serde_json::json!({
            "id": 1, "claim_id": "C-1", "paid_amount_aed": "10.5",
            "status": "not_validated", "error_type": "both", "service_code": "SRV1"
        }))
        .unwrap();

        assert_eq!(claim.status, ClaimStatus::NotValidated);
        assert_eq!(claim.error_type, ErrorType::Both);
        let line = claim_line(&claim);
        assert!(line.contains("not_validated"));
        assert!(line.contains("10.50 AED"));
    }
}
