use std::path::PathBuf;

use anyhow::{Context, Result};
use kaas_common::status;
use serde_json::json;

use super::helpers::{self, Connection};
use crate::output::{print_json, print_success, OutputMode};

#[derive(clap::Args)]
pub struct PutArgs {
    #[arg(help = "Key name")]
    name: String,

    #[arg(long, help = "File holding the encoded private key (binary or hex)")]
    file: PathBuf,
}

pub async fn execute(args: PutArgs, mode: OutputMode, conn: &Connection) -> Result<()> {
    let key = helpers::read_key_file(&args.file)?;
    let mut client = helpers::connect(conn).await?;
    client
        .put_private_key(&args.name, &key)
        .await
        .with_context(|| format!("storing {}", args.name))?;

    match mode {
        OutputMode::Json => print_json(&json!({ "name": args.name, "status": status::KEY_STORED })),
        OutputMode::Human => {
            print_success(&format!("stored {}", args.name));
            Ok(())
        }
    }
}
