use anyhow::{Context as AnyhowContext, Result};
use clap::Subcommand;

use super::Context;
use crate::client::Record;
use crate::output::{print_info, print_json, print_record, print_success};

#[derive(Subcommand)]
pub enum RecordsCommand {
    /// List all records
    List,
    /// Show one record
    Show {
        id: u64,
    },
    /// Merge fields into a record
    Update {
        id: u64,
        /// JSON object of fields, e.g. '{"Nombre": "Ana"}'
        fields: String,
    },
    /// Delete a record
    Delete {
        id: u64,
    },
}

pub async fn run(action: RecordsCommand, ctx: &Context) -> Result<()> {
    match action {
        RecordsCommand::List => list(ctx).await,
        RecordsCommand::Show { id } => show(id, ctx).await,
        RecordsCommand::Update { id, fields } => update(id, &fields, ctx).await,
        RecordsCommand::Delete { id } => delete(id, ctx).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let records = ctx.client().list_records().await?;

    if ctx.json_output {
        print_json(&records)?;
        return Ok(());
    }

    if records.is_empty() {
        print_info("No records");
        return Ok(());
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

async fn show(id: u64, ctx: &Context) -> Result<()> {
    let record = ctx.client().get_record(id).await?;

    if ctx.json_output {
        print_json(&record)?;
    } else {
        print_record(&record);
    }
    Ok(())
}

async fn update(id: u64, fields: &str, ctx: &Context) -> Result<()> {
    let fields = parse_fields(fields)?;
    let response = ctx.client().update_record(id, &fields).await?;

    if ctx.json_output {
        print_json(&response)?;
    } else {
        print_success(response.msg);
    }
    Ok(())
}

async fn delete(id: u64, ctx: &Context) -> Result<()> {
    let response = ctx.client().delete_record(id).await?;

    if ctx.json_output {
        print_json(&response)?;
    } else {
        print_success(response.msg);
    }
    Ok(())
}

fn parse_fields(text: &str) -> Result<Record> {
    serde_json::from_str(text).context("Fields must be a JSON object")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(r#"{"Nombre": "Ana", "Edad": 31}"#).unwrap();
        assert_eq!(fields["Edad"], 31);

        assert!(parse_fields("[1, 2]").is_err());
        assert!(parse_fields("Nombre=Ana").is_err());
    }
}
