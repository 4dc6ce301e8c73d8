use std::process::ExitCode;

use clap::Args;

use majalis_core::Verification;
use majalis_issuer::Issuer;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Certificate id as printed on the certificate.
    pub certificate_id: String,
}

/// Print the certificate's facts. Fails the process when the id is unknown.
pub async fn run(
    issuer: &Issuer,
    args: &VerifyArgs,
    format: &OutputFormat,
) -> anyhow::Result<ExitCode> {
    let verification = issuer.verify(&args.certificate_id).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&verification)?),
        OutputFormat::Text => match verification {
            Verification::Found(ref record) => {
                println!("Certificate {} is valid.", record.certificate_id);
                println!("  Attendee:  {}", record.attendee_name);
                println!("  Session:   {}", record.session_title);
                println!("  Presenter: {}", record.presenter_name);
                println!("  Date:      {}", record.session_date);
                println!("  Issued at: {}", record.issued_at.to_rfc3339());
            }
            Verification::NotFound => {
                eprintln!("Certificate {} not found.", args.certificate_id);
            }
        },
    }

    Ok(if verification.is_found() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
