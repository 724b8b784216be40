mod delete;
mod generate;
mod get;
pub(crate) mod helpers;
mod list;
mod put;

use anyhow::Result;
use clap::Subcommand;

use helpers::Connection;

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Store a private key read from a file")]
    Put(put::PutArgs),
    #[command(about = "Fetch a private key")]
    Get(get::GetArgs),
    #[command(about = "Delete a private key")]
    Delete(delete::DeleteArgs),
    #[command(about = "List stored key names")]
    List,
    #[command(about = "Generate an Ed25519 key and store it")]
    Generate(generate::GenerateArgs),
}

pub async fn run(opts: crate::Opts) -> Result<()> {
    let mode = opts.output_mode();
    let conn = Connection {
        server: opts.server,
        token: opts.token,
        ca_cert: opts.ca_cert,
        domain: opts.domain,
    };
    match opts.cmd {
        Commands::Put(args) => put::execute(args, mode, &conn).await,
        Commands::Get(args) => get::execute(args, mode, &conn).await,
        Commands::Delete(args) => delete::execute(args, mode, &conn).await,
        Commands::List => list::execute(mode, &conn).await,
        Commands::Generate(args) => generate::execute(args, mode, &conn).await,
    }
}
