pub mod command;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod hotkeys;
pub mod layout;
pub mod logging;
pub mod render;
pub mod router;
pub mod shutdown;
pub mod simulate;
pub mod surface;
pub mod ticker;
pub mod viewport;
pub mod worker;

use std::io::IsTerminal;
use std::process::Command as ProcessCommand;

use clap::{error::ErrorKind, Parser};

use config::{load_config, BoardConfig, CliOverrides};
use dashboard::Dashboard;
use errors::BoardError;
use logging::JsonlLogger;

#[derive(Debug, Clone, Parser)]
#[command(name = "progboard")]
#[command(about = "Live multi-pane progress dashboard for worker processes")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub workers: Option<u32>,
    #[arg(long)]
    pub steps: Option<u32>,
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
    /// Run as a simulated worker reporting progress on stdout.
    #[arg(long, hide = true, default_value_t = false)]
    pub simulate: bool,
    #[arg(long, hide = true)]
    pub step_delay_ms: Option<u64>,
}

pub fn run() -> Result<i32, BoardError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    run_from(&args)
}

pub fn run_from(args: &[std::ffi::OsString]) -> Result<i32, BoardError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(BoardError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        title: cli.title.clone(),
        workers: cli.workers,
        steps: cli.steps,
    };
    let cfg = load_config(&overrides)?;

    if cli.simulate {
        let delay = cli.step_delay_ms.unwrap_or(cfg.demo.step_delay_ms);
        simulate::run_simulated_worker(cfg.demo.steps, delay)?;
        return Ok(0);
    }

    if !std::io::stdin().is_terminal() {
        return Err(BoardError::Cli(
            "progboard requires an interactive terminal".to_string(),
        ));
    }

    let logger = cli.log_file.as_deref().map(JsonlLogger::new);
    run_demo(&cfg, logger)
}

/// Spawn the configured number of simulated workers, follow them on the
/// dashboard, tear down once they all exit.
fn run_demo(cfg: &BoardConfig, logger: Option<JsonlLogger>) -> Result<i32, BoardError> {
    let mut dashboard = Dashboard::new(cfg.clone(), logger)?;
    dashboard.start()?;

    let result = drive_demo_workers(cfg, &dashboard);
    let stop = dashboard.stop();
    result?;
    stop?;
    Ok(0)
}

fn drive_demo_workers(cfg: &BoardConfig, dashboard: &Dashboard) -> Result<(), BoardError> {
    dashboard.set_app_steps(f64::from(cfg.demo.workers) * f64::from(cfg.demo.steps))?;

    let exe = std::env::current_exe().map_err(|error| BoardError::Process(error.to_string()))?;
    let mut children = Vec::new();
    for _ in 0..cfg.demo.workers {
        let mut command = ProcessCommand::new(&exe);
        command
            .arg("--simulate")
            .arg("--steps")
            .arg(cfg.demo.steps.to_string())
            .arg("--step-delay-ms")
            .arg(cfg.demo.step_delay_ms.to_string());
        let child = dashboard.spawn_and_register_worker(
            &mut command,
            "Starting",
            f64::from(cfg.demo.steps),
            0.0,
        )?;
        children.push(child);
    }

    for child in &mut children {
        let _ = child.wait();
    }
    Ok(())
}
