use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use kaas_server::config;
use kaas_server::store::open_backend;
use kaas_server::KeystoreServer;

#[derive(Parser, Debug)]
#[command(name = "kaas-server", version, about = "Private key storage service")]
struct Args {
    /// Server configuration file (YAML)
    #[arg(short, long, env = "KAAS_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let cfg = config::load_from_file(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    kaas_server::logging::init(cfg.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kaas-server starting");

    let backend = open_backend(&cfg.keystore).context("opening keystore")?;

    let server = match KeystoreServer::bind(&cfg, backend.clone()).await {
        Ok(server) => server,
        Err(e) => {
            if let Err(close_err) = backend.close() {
                tracing::warn!(error = %close_err, "closing keystore after failed startup");
            }
            return Err(e).context("starting server");
        }
    };

    server.run().await.context("serving")?;
    Ok(())
}
