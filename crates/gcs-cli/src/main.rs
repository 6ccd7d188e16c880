//! Thin CLI entry point: parses a subcommand, wires a [`Kernel`], and gets
//! out of the way. The interactive chat UI and daemon supervision this
//! would grow into a full frontend are out of scope here.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gcs_auth::{status, CredentialStore, CredentialStoreConfig, DeviceFlowClient, DeviceFlowConfig};
use gcs_config::Settings;
use gcs_kernel::Kernel;
use std::io::Write as _;
use tracing_subscriber::EnvFilter;

/// Generic Control System runtime.
#[derive(Parser)]
#[command(name = "gcs", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the runtime and keep it alive until interrupted.
    Run,
    /// List names of available configurations under `CONFIG_DIR`.
    ListConfigs,
    /// Load a named configuration.
    LoadConfig {
        /// Name of the configuration to load.
        #[arg(long = "config-name")]
        config_name: String,
    },
    /// Start an interactive chat session against the active configuration.
    Chat,
    /// Run the OAuth device-authorization flow and persist the credentials.
    Auth,
    /// Show the current credential status.
    AuthStatus,
    /// Switch the active LLM model for subsequent turns.
    SwitchProvider {
        /// Model name to switch to.
        name: String,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            std::process::ExitCode::FAILURE
        },
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::Run => cmd_run(settings).await,
        Commands::ListConfigs => cmd_list_configs(&settings),
        Commands::LoadConfig { config_name } => cmd_load_config(settings, &config_name).await,
        Commands::Chat => cmd_chat(settings).await,
        Commands::Auth => cmd_auth(settings).await,
        Commands::AuthStatus => cmd_auth_status(settings).await,
        Commands::SwitchProvider { name } => cmd_switch_provider(&name),
    }
}

async fn cmd_run(settings: Settings) -> Result<()> {
    let kernel = Kernel::new(settings).await.context("failed to construct runtime")?;
    tracing::info!("runtime started; press ctrl-c to stop");
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    kernel.shutdown().await;
    Ok(())
}

fn cmd_list_configs(settings: &Settings) -> Result<()> {
    let names = gcs_config::list_from(&settings.config_dir).context("failed to list configurations")?;
    if names.is_empty() {
        println!("no configurations found under {}", settings.config_dir.display());
        return Ok(());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

async fn cmd_load_config(settings: Settings, name: &str) -> Result<()> {
    let kernel = Kernel::new(settings).await.context("failed to construct runtime")?;
    kernel.load_configuration(name).await.context("failed to load configuration")?;
    println!("loaded configuration '{name}'");
    kernel.shutdown().await;
    Ok(())
}

async fn cmd_chat(settings: Settings) -> Result<()> {
    let kernel = Kernel::new(settings).await.context("failed to construct runtime")?;
    println!("interactive chat — type 'exit' to quit");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line).context("failed to read input")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }
        match kernel.send_message("cli", line).await {
            Ok(outcome) => println!("{}", outcome.text),
            Err(e) => eprintln!("error: {e}"),
        }
    }
    kernel.shutdown().await;
    Ok(())
}

async fn cmd_auth(settings: Settings) -> Result<()> {
    let Some(client_id) = settings.qwen_client_id.clone() else {
        bail!("QWEN_CLIENT_ID and QWEN_AUTHORIZATION_SERVER must be set to authenticate");
    };
    let Some(authorization_server) = settings.qwen_authorization_server.clone() else {
        bail!("QWEN_CLIENT_ID and QWEN_AUTHORIZATION_SERVER must be set to authenticate");
    };

    let device_flow = DeviceFlowClient::new(DeviceFlowConfig { client_id, authorization_server });
    let (authorization, device_code, pkce, interval) =
        device_flow.authenticate().await.context("failed to start device authorization")?;

    println!("visit {} and enter code {}", authorization.verification_uri, authorization.user_code);
    let creds = device_flow.poll(&device_code, &pkce, interval).await.context("device authorization did not complete")?;

    let store = CredentialStore::with_config(CredentialStoreConfig {
        path: settings.runtime_data_dir.join("oauth_creds.json"),
        lock_timeout: std::time::Duration::from_secs(10),
    });
    store.save(&creds).await.context("failed to persist credentials")?;
    println!("authenticated");
    Ok(())
}

async fn cmd_auth_status(settings: Settings) -> Result<()> {
    let store = CredentialStore::with_config(CredentialStoreConfig {
        path: settings.runtime_data_dir.join("oauth_creds.json"),
        lock_timeout: std::time::Duration::from_secs(10),
    });
    let current = status(&store).await.context("failed to read credential status")?;
    if current.has_credentials {
        println!("credentials present, valid = {}, expires_at = {:?}", current.is_valid, current.expires_at);
    } else {
        println!("no credentials stored");
    }
    Ok(())
}

fn cmd_switch_provider(name: &str) -> Result<()> {
    // Only the model name is swappable at runtime; base URL / auth stay
    // fixed to what LLM_BASE_URL / LLM_API_KEY / QWEN_* already resolved.
    println!("set LLM_MODEL={name} and restart 'run' or 'chat' to take effect");
    Ok(())
}
