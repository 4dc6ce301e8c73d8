use std::fmt::Write;

use clap::Args;

use majalis_core::{BatchReport, OutcomeStatus, SessionId};
use majalis_issuer::{Authorization, Issuer};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Session to issue certificates for.
    #[arg(long)]
    pub session: String,
}

pub async fn run(issuer: &Issuer, args: &IssueArgs, format: &OutputFormat) -> anyhow::Result<()> {
    // Whoever can run the binary against this store owns every session.
    let report = issuer
        .issue_session(&SessionId::new(&args.session), Authorization::Granted)
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", summary(&report)),
    }
    Ok(())
}

fn summary(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Session {}: {} issued, {} failed, {} notification failures ({} new)",
        report.session_id,
        report.issued(),
        report.failed(),
        report.notify_failures(),
        report.minted(),
    );
    for outcome in &report.outcomes {
        let id = outcome
            .certificate_id
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string);
        let status = match &outcome.status {
            OutcomeStatus::Issued { notified: true } => "issued, notified".to_owned(),
            OutcomeStatus::Issued { notified: false } => "issued".to_owned(),
            OutcomeStatus::IssuedNotifyFailed { error } => {
                format!("issued, notification failed: {error}")
            }
            OutcomeStatus::RenderFailed { error } => format!("render failed: {error}"),
            OutcomeStatus::AllocationFailed { error } => format!("allocation failed: {error}"),
        };
        let _ = writeln!(out, "  {}  {id}  {status}", outcome.attendee_name);
    }
    out
}
