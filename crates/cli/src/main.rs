mod cmd;
mod output;
#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cmd::Commands;
use output::OutputMode;

#[derive(Parser)]
#[command(name = "kaas", version, about = "Keystore admin CLI")]
pub struct Opts {
    #[clap(subcommand)]
    cmd: Commands,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,

    #[arg(
        long,
        global = true,
        env = "KAAS_SERVER",
        default_value = "http://127.0.0.1:9998",
        help = "Keystore server URL"
    )]
    server: String,

    #[arg(long, global = true, env = "KAAS_AUTH_KEY", hide_env_values = true, help = "Shared auth token")]
    token: Option<String>,

    #[arg(long, global = true, help = "CA certificate (PEM) used to verify the server")]
    ca_cert: Option<PathBuf>,

    #[arg(long, global = true, help = "Server name to verify instead of the URL host")]
    domain: Option<String>,
}

impl Opts {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    cmd::run(opts).await
}
