mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagevet_engine::{
    FixtureStore, RouteRegistry, RunnerConfig, ScenarioRunner, Session, SessionConfig,
};
use pagevet_models::ScenarioFile;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenarios,
            evidence_dir,
            headful,
            block_unmatched,
            navigation_timeout_ms,
            chrome,
        } => {
            let session_config = SessionConfig {
                headless: !headful,
                navigation_timeout: Duration::from_millis(navigation_timeout_ms),
                block_unmatched,
                chrome_executable: chrome,
                ..SessionConfig::default()
            };
            run_scenarios(&scenarios, evidence_dir, session_config).await
        }
    }
}

async fn run_scenarios(
    scenarios: &[PathBuf],
    evidence_dir: PathBuf,
    session_config: SessionConfig,
) -> ExitCode {
    let runner = ScenarioRunner::new(RunnerConfig { evidence_dir });
    let mut any_failed = false;

    for path in scenarios {
        let file = match load_scenario(path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("pagevet: {err:#}");
                return ExitCode::from(2);
            }
        };

        let registry = match build_registry(&file) {
            Ok(registry) => registry,
            Err(err) => {
                eprintln!("pagevet: {}: {err:#}", file.name);
                return ExitCode::from(2);
            }
        };

        let session = match Session::start(session_config.clone(), registry).await {
            Ok(session) => session,
            Err(err) => {
                eprintln!("pagevet: could not start browser session: {err}");
                return ExitCode::from(2);
            }
        };

        info!(scenario = %file.name, path = %path.display(), "loaded scenario");
        let result = runner.run(session, &file.scenario()).await;

        if result.passed() {
            println!(
                "PASS {} ({} steps, {}ms)",
                result.scenario,
                file.steps.len(),
                result.duration_ms
            );
        } else {
            any_failed = true;
            println!("FAIL {} ({}ms)", result.scenario, result.duration_ms);
            eprintln!(
                "  step {}: {}",
                result.failed_step.unwrap_or(0),
                result.error.as_deref().unwrap_or("unknown failure")
            );
            if let Some(evidence) = &result.evidence {
                eprintln!("  evidence: {}", evidence.display());
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_scenario(path: &Path) -> Result<ScenarioFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read scenario file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid scenario file {}", path.display()))
}

fn build_registry(file: &ScenarioFile) -> Result<RouteRegistry> {
    let store = FixtureStore::from(file.fixtures.clone());
    let registry = RouteRegistry::from_bindings(&file.routes, &store)
        .context("failed to register routes")?;
    Ok(registry)
}
