use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct SampleTemplateArgs {
    /// Where to write the `.docx` file.
    #[arg(default_value = "sample_template.docx")]
    pub path: PathBuf,
}

/// Write a DOCX template using every supported placeholder.
pub fn run(args: &SampleTemplateArgs) -> anyhow::Result<()> {
    let template = majalis_render::sample_template()?;
    std::fs::write(&args.path, template)?;
    println!("Sample template written to {}", args.path.display());
    Ok(())
}
