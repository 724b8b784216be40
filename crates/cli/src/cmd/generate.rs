use anyhow::{Context, Result};
use kaas_common::PrivateKey;

use super::helpers::{self, Connection, KeySummary};
use crate::output::{print_info, print_json, print_success, OutputMode};

#[derive(clap::Args)]
pub struct GenerateArgs {
    #[arg(help = "Name to store the new key under")]
    name: String,
}

pub async fn execute(args: GenerateArgs, mode: OutputMode, conn: &Connection) -> Result<()> {
    let key = PrivateKey::generate_ed25519();
    let mut client = helpers::connect(conn).await?;
    client
        .put_private_key(&args.name, &key)
        .await
        .with_context(|| format!("storing {}", args.name))?;

    let summary = KeySummary::new(&args.name, &key);
    match mode {
        OutputMode::Json => print_json(&summary),
        OutputMode::Human => {
            print_success(&format!("generated {}", args.name));
            print_info("public key", &summary.public_key);
            Ok(())
        }
    }
}
