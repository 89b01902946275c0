use anyhow::Result;
use intent_gateway::cli::{Args, ConfigDiscovery, ExecutionMode};
use intent_gateway::{Gateway, GatewayError, env};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(mode, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so JSON on stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("intent_gateway=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env::DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(mode: ExecutionMode, args: &Args) -> Result<()> {
    if let ExecutionMode::ShowConfig = mode {
        return ConfigDiscovery::show_discovery_info(args.config.as_deref());
    }

    let config = ConfigDiscovery::load(args.config.as_deref())?;
    let gateway = Gateway::new(config)?;
    info!("Gateway ready");

    match mode {
        ExecutionMode::Classify(text) => print_json(&gateway.classify(&text).await?),
        ExecutionMode::Complete(params) => print_json(&gateway.complete(params).await?),
        ExecutionMode::Route { text, provider } => {
            print_json(&gateway.respond(&text, provider.as_deref()).await?)
        }
        ExecutionMode::Status => print_json(&gateway.status().await),
        ExecutionMode::ShowConfig => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_error(err: &anyhow::Error) {
    let body = match err.downcast_ref::<GatewayError>() {
        Some(gateway_error) => gateway_error.to_json(),
        None => serde_json::json!({
            "error": "E_CONFIG",
            "message": format!("{err:#}"),
            "status": 500,
        }),
    };

    error!("{}", body["message"]);
    eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string()));
}
