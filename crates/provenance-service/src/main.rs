//! Provenance Service Binary

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use provenance_contracts::{ChainClient, DevChain, DeploymentStore, HttpChainClient, JsonFileStore};
use provenance_core::{DigestProver, KeyPair};
use provenance_service::{
    create_router, serve_until, shutdown_signal, AppState, KeyRegistry, ServiceConfig,
    ShutdownConfig, ShutdownOutcome,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(ShutdownOutcome::Destroyed) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServiceConfig) -> Result<ShutdownOutcome, Box<dyn std::error::Error>> {
    info!(
        environment = ?config.environment,
        network = %config.network,
        port = config.port,
        "Starting provenance service"
    );

    let accounts = signing_accounts(&config)?;
    let chain: Arc<dyn ChainClient> = if config.is_development() {
        Arc::new(DevChain::new())
    } else {
        let mut client = HttpChainClient::new(config.network.clone(), config.chain_endpoint()?);
        if let Some(sender) = accounts.first() {
            client = client.with_sender(sender.address());
        }
        Arc::new(client)
    };
    let store: Arc<dyn DeploymentStore> = Arc::new(JsonFileStore::new(&config.deployments_path));

    // Contract resolution must succeed before anything is served
    let port = config.port;
    let shutdown = ShutdownConfig {
        drain_grace: config.drain_grace,
        force_grace: config.force_grace,
    };
    let state = Arc::new(
        AppState::initialize(config, chain, store, Arc::new(DigestProver::new()), accounts).await?,
    );

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Provenance service listening");

    // Circuits load in the background; a failure shuts the service down
    let (failed_tx, failed_rx) = oneshot::channel::<()>();
    let load_failed = Arc::new(AtomicBool::new(false));
    let loader = state.clone();
    let failed_flag = load_failed.clone();
    tokio::spawn(async move {
        match loader.load_circuits().await {
            Ok(()) => info!("Service ready"),
            Err(e) => {
                error!(error = %e, "Failed to load circuit artifacts");
                failed_flag.store(true, Ordering::SeqCst);
                let _ = failed_tx.send(());
            }
        }
    });

    let signal = async move {
        tokio::select! {
            _ = shutdown_signal() => {}
            Ok(()) = failed_rx => {}
        }
    };

    let outcome = serve_until(listener, create_router(state.clone()), signal, shutdown).await?;
    info!(outcome = ?outcome, "Provenance service stopped");

    if load_failed.load(Ordering::SeqCst) {
        return Err("circuit artifacts could not be loaded".into());
    }
    Ok(outcome)
}

fn signing_accounts(config: &ServiceConfig) -> Result<Vec<KeyPair>, Box<dyn std::error::Error>> {
    if let Some(private_key) = &config.private_key {
        return Ok(vec![KeyPair::from_hex(private_key)?]);
    }
    if config.is_development() {
        return Ok(KeyRegistry::development_accounts(config.dev_accounts));
    }
    Ok(Vec::new())
}
