use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};

use toolhop::cli::{Cli, Commands};
use toolhop::config::Config;
use toolhop::gateway::{self, AppState};
use toolhop::llm::{LlmClient, OpenAiClient, OpenAiConfig};
use toolhop::tools::default_registry;
use toolhop::transport::{ToolClient, ToolClientConfig, ToolServer};

fn setup_logging(cli: &Cli, config: &Config) {
    // RUST_LOG wins; -v forces debug; otherwise the config decides
    let default_filter = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

/// Run the tool service: builtin registry behind the wire protocol.
async fn run_serve_tools(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.transport.host.clone());
    let port = port.unwrap_or(config.transport.port);
    let addr = format!("{host}:{port}");

    let registry = default_registry().context("Failed to build the builtin tool registry")?;
    info!("Registered {} builtin tools", registry.len());

    let server = ToolServer::bind(&addr, registry)
        .await
        .context(format!("Failed to bind tool service on {addr}"))?;
    println!("{} {}", "Tool service listening on".green(), server.local_addr()?);

    server.run().await.context("Tool service failed")?;
    Ok(())
}

/// Run the HTTP gateway: OpenAI client + tool service client + orchestrator.
async fn run_gateway(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.gateway.host.clone());
    let port = port.unwrap_or(config.gateway.port);
    let addr = format!("{host}:{port}");

    let llm_config = OpenAiConfig {
        model: config.llm.model.clone(),
        base_url: config.llm.base_url.clone(),
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
        timeout: Duration::from_secs(config.llm.timeout_seconds),
    };
    let llm = OpenAiClient::new(llm_config).context("Failed to create the model client")?;
    info!("Model client ready: {}", llm.model());

    let transport = ToolClient::new(ToolClientConfig {
        addr: config.transport.addr(),
        request_timeout_ms: config.transport.request_timeout_ms,
    });
    match transport.list_tools().await {
        Ok(tools) => info!("Tool service at {} serves {} tools", transport.addr(), tools.len()),
        Err(e) => warn!("Tool service not reachable at startup ({e}); will keep retrying per request"),
    }

    let state = AppState::new(
        Arc::new(llm),
        Arc::new(transport),
        Duration::from_secs(config.agent.turn_timeout_seconds),
    );

    println!("{} {}", "Gateway listening on".green(), addr);
    gateway::serve(&addr, state).await.context("Gateway failed")?;
    Ok(())
}

/// Print the catalog of a running tool service.
async fn run_tools(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.transport.host.clone());
    let port = port.unwrap_or(config.transport.port);
    let client = ToolClient::with_addr(format!("{host}:{port}"));

    let tools = client
        .list_tools()
        .await
        .context(format!("Failed to fetch the tool catalog from {host}:{port}"))?;

    println!("{} ({} available)", "Tools".cyan().bold(), tools.len());
    for tool in &tools {
        println!("  {} - {}", tool.name.green(), tool.description);
        for param in &tool.parameters {
            let requirement = if param.required { "required" } else { "optional" };
            match &param.description {
                Some(desc) => println!(
                    "      {} ({}, {}): {}",
                    param.name,
                    param.param_type.as_str(),
                    requirement,
                    desc
                ),
                None => println!("      {} ({}, {})", param.name, param.param_type.as_str(), requirement),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(&cli, &config);

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::ServeTools { host, port } => run_serve_tools(&config, host.clone(), *port).await,
        Commands::Gateway { host, port } => run_gateway(&config, host.clone(), *port).await,
        Commands::Tools { host, port } => run_tools(&config, host.clone(), *port).await,
    }
}
