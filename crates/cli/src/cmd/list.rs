use anyhow::{Context, Result};

use super::helpers::{self, Connection};
use crate::output::{print_json, OutputMode};

pub async fn execute(mode: OutputMode, conn: &Connection) -> Result<()> {
    let mut client = helpers::connect(conn).await?;
    let mut names = client.list_private_keys().await.context("listing keys")?;
    names.sort();

    match mode {
        OutputMode::Json => print_json(&names),
        OutputMode::Human => {
            if names.is_empty() {
                println!("no keys stored");
            }
            for name in &names {
                println!("{name}");
            }
            Ok(())
        }
    }
}
