// l2-activate
// Registers a signing key for a zkLink Layer-2 account by submitting a ChangePubKey transaction

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use env_logger::Env;
use l2_activate::activation::{ActivationOutcome, Activator, AssumeYes, Confirmation};
use l2_activate::bridge::SignerBridge;
use l2_activate::config::{self, Config, Overrides};
use l2_activate::eth::EthSigner;
use l2_activate::output::{self, TerminalPrompt};
use l2_activate::rpc::RpcClient;
use l2_activate::wallet::WalletSdk;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "l2-activate")]
#[command(about = "Activate a zkLink Layer-2 account", long_about = None)]
struct Cli {
    /// zkLink JSON-RPC endpoint
    #[arg(long, env = "ZKLINK_ENDPOINT")]
    endpoint: Option<String>,

    /// L1 private key (hex)
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// zkLink signer service endpoint
    #[arg(long, env = "SIGNER_URL")]
    signer_url: Option<String>,

    /// Secrets file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Activate without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Dotenv files feed the `env` attributes, so they load before parsing.
    let dotenv_result = config::load_dotenv_files();
    let cli = Cli::parse();

    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("info")
    };
    env_logger::init_from_env(env);

    let result = match dotenv_result {
        Ok(loaded) => {
            for path in &loaded {
                log::debug!("loaded environment from {}", path.display());
            }
            run(cli).await
        }
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(outcome) => {
            output::report_outcome(&outcome);
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            log::error!("{:#}", e);
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ActivationOutcome> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(Overrides {
        endpoint: cli.endpoint,
        private_key: cli.private_key,
        signer_url: cli.signer_url,
    });
    let settings = config.resolve()?;
    log::debug!("{:?}", settings);

    let signer = EthSigner::from_hex(&settings.private_key)?;
    println!("{} {}", "Wallet address:".green(), signer.address());

    let rpc = RpcClient::new(settings.endpoint.clone(), settings.timeout)?;
    let signer_service = RpcClient::new(settings.signer_url.clone(), settings.timeout)?;
    let wallet = SignerBridge::new(Arc::new(signer_service))
        .derive_wallet(&signer)
        .await
        .context("failed to derive L2 wallet")?;

    let confirmation: Box<dyn Confirmation> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompt)
    };

    output::print_info(&format!("Waiting for account on {}", rpc.url()));
    let outcome = Activator::new(&rpc, &wallet, confirmation.as_ref())
        .with_poll_interval(settings.poll_interval)
        .run()
        .await?;

    Ok(outcome)
}
