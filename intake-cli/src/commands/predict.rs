use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::output::{print_json, print_success};

pub async fn run(ctx: &Context) -> Result<()> {
    let response = ctx.client().predict_all().await?;

    if ctx.json_output {
        print_json(&response)?;
        return Ok(());
    }

    print_success(&response.msg);
    for record in &response.records {
        let id = record.get("ID").cloned().unwrap_or_default();
        let label = record
            .get("Prediccion_IA")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        println!("  {} {}: {}", "ID".dimmed(), id, label);
    }
    Ok(())
}
