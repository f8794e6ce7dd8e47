use anyhow::Result;

use super::Context;
use crate::output::print_json;

pub async fn run(ctx: &Context) -> Result<()> {
    let pem = ctx.client().public_key().await?;

    if ctx.json_output {
        print_json(&serde_json::json!({ "publicKey": pem }))?;
    } else {
        print!("{pem}");
        if !pem.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
