use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::BoardError;
use crate::render::DEFAULT_TIME_FORMAT;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub title: Option<String>,
    pub workers: Option<u32>,
    pub steps: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardConfig {
    pub ui: UiConfig,
    pub input: InputConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    pub title: String,
    pub tick_interval_ms: u64,
    pub time_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    pub poll_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoConfig {
    pub workers: u32,
    pub steps: u32,
    pub step_delay_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            ui: UiConfig {
                title: "progboard".to_string(),
                tick_interval_ms: 1000,
                time_format: DEFAULT_TIME_FORMAT.to_string(),
            },
            input: InputConfig {
                poll_timeout_ms: 500,
            },
            demo: DemoConfig {
                workers: 4,
                steps: 100,
                step_delay_ms: 250,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialBoardConfig {
    ui: Option<PartialUiConfig>,
    input: Option<PartialInputConfig>,
    demo: Option<PartialDemoConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialUiConfig {
    title: Option<String>,
    tick_interval_ms: Option<u64>,
    time_format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialInputConfig {
    poll_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialDemoConfig {
    workers: Option<u32>,
    steps: Option<u32>,
    step_delay_ms: Option<u64>,
}

pub fn load_config(overrides: &CliOverrides) -> Result<BoardConfig, BoardError> {
    let mut cfg = BoardConfig::default();

    if let Some(path) = &overrides.config_path {
        let contents =
            std::fs::read_to_string(path).map_err(|e| BoardError::Io(e.to_string()))?;
        let partial: PartialBoardConfig =
            toml::from_str(&contents).map_err(|e| BoardError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut BoardConfig, partial: PartialBoardConfig) {
    if let Some(ui) = partial.ui {
        if let Some(title) = ui.title {
            cfg.ui.title = title;
        }
        if let Some(tick_interval_ms) = ui.tick_interval_ms {
            cfg.ui.tick_interval_ms = tick_interval_ms;
        }
        if let Some(time_format) = ui.time_format {
            cfg.ui.time_format = time_format;
        }
    }

    if let Some(input) = partial.input {
        if let Some(poll_timeout_ms) = input.poll_timeout_ms {
            cfg.input.poll_timeout_ms = poll_timeout_ms;
        }
    }

    if let Some(demo) = partial.demo {
        if let Some(workers) = demo.workers {
            cfg.demo.workers = workers;
        }
        if let Some(steps) = demo.steps {
            cfg.demo.steps = steps;
        }
        if let Some(step_delay_ms) = demo.step_delay_ms {
            cfg.demo.step_delay_ms = step_delay_ms;
        }
    }
}

fn apply_cli_overrides(cfg: &mut BoardConfig, overrides: &CliOverrides) {
    if let Some(title) = &overrides.title {
        cfg.ui.title = title.clone();
    }
    if let Some(workers) = overrides.workers {
        cfg.demo.workers = workers;
    }
    if let Some(steps) = overrides.steps {
        cfg.demo.steps = steps;
    }
}

fn validate_config(cfg: &BoardConfig) -> Result<(), BoardError> {
    if cfg.ui.tick_interval_ms == 0 {
        return Err(BoardError::InvalidConfig(
            "ui.tick_interval_ms must be greater than zero".to_string(),
        ));
    }
    if cfg.input.poll_timeout_ms == 0 {
        return Err(BoardError::InvalidConfig(
            "input.poll_timeout_ms must be greater than zero".to_string(),
        ));
    }
    if cfg.demo.workers == 0 {
        return Err(BoardError::InvalidConfig(
            "demo.workers must be greater than zero".to_string(),
        ));
    }
    if cfg.demo.steps == 0 {
        return Err(BoardError::InvalidConfig(
            "demo.steps must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
