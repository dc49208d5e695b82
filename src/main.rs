use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use langgraph_helper::agent::Agent;
use langgraph_helper::cli::Cli;
use langgraph_helper::config::Config;
use langgraph_helper::presenter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::from(1)
        }
    }
}

/// Single-line report of a fatal error, including its cause chain.
fn failure_message(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let run = cli.run_options();
    let config = Config::load(&cli.config)?.with_env_keys();

    if let Err(e) = config.validate(&run) {
        eprintln!("{e}");
        return Ok(ExitCode::from(2));
    }

    info!(
        "Mode: {} | Retrieval: {} | Web search: {}",
        run.mode, run.retrieval, run.web_search
    );
    info!("Query: {}", cli.query);

    let agent = Agent::from_config(&config, &run)?;
    let answer = agent.run(&cli.query).await?;

    println!("{}", presenter::render(&answer));
    Ok(ExitCode::SUCCESS)
}
