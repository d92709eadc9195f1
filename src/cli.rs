use crate::config::{AppConfig, EnvSource};
use crate::model::AutomationId;
use crate::runner::{self, GlobalOptions};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "nexora",
    version,
    about = "Small-business automation demo: audit intake, automations and test runner"
)]
pub struct Cli {
    /// Project root containing public/, data/, logs/ and an optional .env
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the site, the audit API and the automation API
    Serve {
        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Exercise automations directly or end to end and write Markdown reports
    RunTests(RunTestsArgs),
}

#[derive(Debug, Args, Clone)]
#[command(group = clap::ArgGroup::new("mode").multiple(false))]
pub struct RunTestsArgs {
    /// Repeat one automation until --times successes or the first failure
    #[arg(long, group = "mode", value_parser = parse_automation_id)]
    pub automation: Option<AutomationId>,

    /// Run the per-automation sequence for every automation (default)
    #[arg(long, group = "mode")]
    pub all: bool,

    /// Spawn the server and drive audit submissions and automations over HTTP
    #[arg(long, group = "mode")]
    pub global: bool,

    /// Required successes per automation (default 5), or global passes (default 3)
    #[arg(long)]
    pub times: Option<usize>,

    /// Port for the spawned server in --global mode
    #[arg(long, default_value_t = 4000)]
    pub port: u16,

    /// Wait after spawning the server before the first request
    #[arg(long, default_value = "2s")]
    pub startup_delay: humantime::Duration,
}

fn parse_automation_id(s: &str) -> Result<AutomationId, String> {
    s.parse::<AutomationId>().map_err(|_| {
        let known: Vec<&str> = AutomationId::ALL.iter().map(|id| id.as_str()).collect();
        format!("expected one of: {}", known.join(", "))
    })
}

/// Build the runtime configuration rooted at `--root`.
pub fn load_config(args: &Cli) -> Result<AppConfig> {
    let env = EnvSource::load(&args.root)?;
    Ok(AppConfig::from_env(&env, args.root.clone()))
}

pub async fn run(args: Cli) -> Result<()> {
    let mut config = load_config(&args)?;
    match args.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            crate::server::serve(config).await
        }
        Command::RunTests(opts) => run_tests(config, opts).await,
    }
}

async fn run_tests(config: AppConfig, opts: RunTestsArgs) -> Result<()> {
    if opts.global {
        let global = GlobalOptions {
            port: opts.port,
            times: opts.times.unwrap_or(3),
            startup_delay: Duration::from(opts.startup_delay),
            server_exe: std::env::current_exe().context("locate current executable")?,
        };
        let path = runner::run_global(&config, &global).await?;
        println!("Global test report written to {}", path.display());
        return Ok(());
    }

    let times = opts.times.unwrap_or(5);
    let outcomes = match opts.automation {
        Some(id) => {
            let registry = crate::automations::Registry::from_config(&config);
            tokio::task::spawn_blocking(move || {
                runner::run_automation_suite(&registry, id, times, &config.paths.reports_dir)
                    .map(|o| vec![o])
            })
            .await
            .context("automation test task failed")??
        }
        None => tokio::task::spawn_blocking(move || runner::run_all_suites(&config, times))
            .await
            .context("automation test task failed")??,
    };
    for o in &outcomes {
        let verdict = if o.failed { "FAILED" } else { "ok" };
        println!(
            "Finished tests for {} ({verdict}, {}/{} successful attempts). Report written to {}",
            o.automation,
            o.successes,
            o.attempts,
            o.report_path.display()
        );
    }
    Ok(())
}
