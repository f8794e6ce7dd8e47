use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use super::Context;
use crate::output::{print_json, print_success};

#[derive(Args)]
pub struct RegisterArgs {
    /// JSON file holding one record object
    pub file: PathBuf,
}

pub async fn run(args: RegisterArgs, ctx: &Context) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    // Refuse locally what the server would refuse after decryption
    let record: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;
    if !record.is_object() {
        anyhow::bail!("{} must contain a JSON object", args.file.display());
    }

    let client = ctx.client();
    let pem = client.public_key().await?;
    let envelope = intake_core::seal(&pem, &bytes)?;
    let response = client.register(&envelope).await?;

    if ctx.json_output {
        print_json(&response)?;
    } else {
        print_success(&response.msg);
        println!("  {}: {}", "ID".dimmed(), response.id);
    }

    Ok(())
}
