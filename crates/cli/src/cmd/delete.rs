use anyhow::{Context, Result};
use kaas_common::status;
use serde_json::json;

use super::helpers::{self, Connection};
use crate::output::{print_json, print_success, OutputMode};

#[derive(clap::Args)]
pub struct DeleteArgs {
    #[arg(help = "Key name")]
    name: String,
}

pub async fn execute(args: DeleteArgs, mode: OutputMode, conn: &Connection) -> Result<()> {
    let mut client = helpers::connect(conn).await?;
    client
        .delete_private_key(&args.name)
        .await
        .with_context(|| format!("deleting {}", args.name))?;

    match mode {
        OutputMode::Json => print_json(&json!({ "name": args.name, "status": status::KEY_DELETED })),
        OutputMode::Human => {
            print_success(&format!("deleted {}", args.name));
            Ok(())
        }
    }
}
