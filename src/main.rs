use anyhow::{Context, Result};
use deployer::cli::commands::{DeployCommand, ReleasesCommand, RollbackCommand, UnlockCommand, VersionCommand};
use deployer::cli::output::*;
use deployer::cli::{Cli, Command};
use deployer::core::DeployConfig;
use deployer::execution::{ExecutionEngine, ExecutionEvent};
use deployer::release::{self, RollbackTarget};
use deployer::remote::{self, RemoteExecutor};
use deployer::version::version_info;
use indicatif::ProgressBar;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let result = match &cli.command {
        Command::Deploy(cmd) => deploy(cmd).await,
        Command::Rollback(cmd) => rollback(cmd).await,
        Command::Releases(cmd) => list_releases(cmd).await,
        Command::Unlock(cmd) => unlock(cmd).await,
        Command::Version(cmd) => show_version(cmd),
    };

    if let Err(err) = result {
        eprintln!("\n{} {}", CROSS, style(format!("{:#}", err)).red());
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(path: &str) -> Result<DeployConfig> {
    let config = DeployConfig::from_file(path)
        .with_context(|| format!("Failed to load deployment config {}", path))?;
    Ok(config)
}

async fn connect(config: &DeployConfig) -> Result<Box<dyn RemoteExecutor>> {
    let executor = remote::connect(config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.host))?;
    Ok(executor)
}

/// Close the connection, keeping the operation's own error first
async fn finish<T>(executor: Box<dyn RemoteExecutor>, result: Result<T>) -> Result<T> {
    let closed = executor.close().await;
    let value = result?;
    closed.context("Failed to close connection")?;
    Ok(value)
}

/// Print events as they arrive, with a spinner while a task is running
fn console_event_handler() -> impl Fn(ExecutionEvent) + Send + Sync + 'static {
    let spinner: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));

    move |event| {
        let Ok(mut active) = spinner.lock() else {
            return;
        };
        if let Some(bar) = active.take() {
            bar.finish_and_clear();
        }

        println!("{}", format_execution_event(&event));

        match &event {
            ExecutionEvent::TaskStarted { name, .. } => {
                *active = Some(create_spinner(format!("Running {}", name)));
            }
            ExecutionEvent::TaskFailed { error, .. } => {
                println!("{}", style(format_output(error, 10)).dim());
            }
            _ => {}
        }
    }
}

async fn deploy(cmd: &DeployCommand) -> Result<()> {
    let config = load_config(&cmd.config)?;
    println!(
        "{} Deploying {} to {}",
        INFO,
        style(&config.branch).bold(),
        style(format!("{}:{}", config.host, config.root_path)).cyan()
    );

    let executor = connect(&config).await?;
    let result = {
        let mut engine = ExecutionEngine::new(&*executor);
        engine.add_event_handler(console_event_handler());
        engine.deploy(&config).await.context("Deployment failed")
    };
    let report = finish(executor, result).await?;

    println!(
        "\n{} Release {} is live",
        CHECK,
        style(&report.release).green().bold()
    );
    if !report.pruned.is_empty() {
        println!("{} Removed {} old release(s)", INFO, report.pruned.len());
    }
    Ok(())
}

async fn rollback(cmd: &RollbackCommand) -> Result<()> {
    let config = load_config(&cmd.config)?;
    let target = RollbackTarget::from_option(cmd.version.as_deref());

    let executor = connect(&config).await?;
    let result = {
        let mut engine = ExecutionEngine::new(&*executor);
        engine.add_event_handler(console_event_handler());
        engine.rollback(&config, &target).await.context("Rollback failed")
    };
    let report = finish(executor, result).await?;

    println!(
        "\n{} Rolled back to {} ({} archived as {})",
        CHECK,
        style(&report.target).green().bold(),
        report.displaced,
        style(&report.archived_as).dim()
    );
    Ok(())
}

async fn list_releases(cmd: &ReleasesCommand) -> Result<()> {
    let config = load_config(&cmd.config)?;
    let layout = config.layout();

    let executor = connect(&config).await?;
    let result = async {
        let releases = release::list_releases(&*executor, &layout).await?;
        let current = release::resolve_current(&*executor, &layout).await?;
        Ok::<_, deployer::DeployError>((releases, current))
    }
    .await
    .context("Failed to list releases");
    let (releases, current) = finish(executor, result).await?;

    if cmd.json {
        let data = serde_json::json!({
            "root": layout.root(),
            "current": current,
            "releases": releases,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if releases.is_empty() {
        println!("{} No releases under {}", INFO, layout.root());
        return Ok(());
    }

    println!("{} Releases under {}:", INFO, style(layout.root()).bold());
    println!("{}", format_releases(&releases, current.as_ref()));
    Ok(())
}

async fn unlock(cmd: &UnlockCommand) -> Result<()> {
    let config = load_config(&cmd.config)?;
    let layout = config.layout();

    let executor = connect(&config).await?;
    let result = release::force_unlock(&*executor, &layout)
        .await
        .context("Failed to remove lock");
    let removed = finish(executor, result).await?;

    if removed {
        println!("{} Removed lock on {}", CHECK, layout.root());
    } else {
        println!("{} {} was not locked", INFO, layout.root());
    }
    Ok(())
}

fn show_version(cmd: &VersionCommand) -> Result<()> {
    let info = version_info();
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info);
    }
    Ok(())
}
