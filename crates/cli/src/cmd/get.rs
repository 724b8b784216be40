use std::path::PathBuf;

use anyhow::{Context, Result};

use super::helpers::{self, Connection, KeySummary};
use crate::output::{print_info, print_json, print_success, OutputMode};

#[derive(clap::Args)]
pub struct GetArgs {
    #[arg(help = "Key name")]
    name: String,

    #[arg(long, help = "Write the encoded key here instead of printing it")]
    out: Option<PathBuf>,
}

pub async fn execute(args: GetArgs, mode: OutputMode, conn: &Connection) -> Result<()> {
    let mut client = helpers::connect(conn).await?;
    let key = client
        .get_private_key(&args.name)
        .await
        .with_context(|| format!("fetching {}", args.name))?;

    let mut summary = KeySummary::new(&args.name, &key);
    match &args.out {
        Some(path) => helpers::write_key_file(path, &key)?,
        None => summary.private_key = Some(hex::encode(key.to_bytes())),
    }

    match mode {
        OutputMode::Json => print_json(&summary),
        OutputMode::Human => {
            if let Some(path) = &args.out {
                print_success(&format!("wrote {} to {}", args.name, path.display()));
            }
            print_info("name", &summary.name);
            print_info("type", summary.key_type);
            print_info("public key", &summary.public_key);
            if let Some(private) = &summary.private_key {
                print_info("private key", private);
            }
            Ok(())
        }
    }
}
