use crate::command_toggle::CommandToggle;
use crate::probe::ProbeConfig;
use crate::systemd::{Scope, SystemdService};
use crate::theme::Theme;
use crate::widget::{ToggleWidget, Toggleable};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

// Used when no config file is given
const EMBEDDED_CONFIG: &str = include_str!("../config.yaml");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Overrides for the default color table
    #[serde(default)]
    pub theme: BTreeMap<String, String>,
    /// Default polling period for every block
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    /// Upper bound on probe commands; unset waits indefinitely
    #[serde(default)]
    pub probe_timeout_secs: Option<f64>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Service {
        unit: String,
        #[serde(default)]
        scope: Scope,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        interval_secs: Option<f64>,
    },
    Toggle {
        name: String,
        #[serde(flatten)]
        mode: ToggleMode,
        probe_command: String,
        #[serde(default)]
        probe_args: Vec<String>,
        #[serde(default = "default_on_state")]
        on_state: String,
        #[serde(default = "default_off_state")]
        off_state: String,
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        interval_secs: Option<f64>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ToggleMode {
    /// Single command that toggles between states
    Single {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Separate commands for on and off states
    Separate {
        on_command: String,
        #[serde(default)]
        on_args: Vec<String>,
        off_command: String,
        #[serde(default)]
        off_args: Vec<String>,
    },
}

fn default_interval_secs() -> f64 {
    5.0
}

fn default_on_state() -> String {
    "on".to_string()
}

fn default_off_state() -> String {
    "off".to_string()
}

// Negative or non-finite values count as zero
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl Config {
    pub fn theme(&self) -> Theme {
        Theme::with_overrides(&self.theme)
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout: self.probe_timeout_secs.map(secs),
        }
    }

    /// Builds one widget per block, in bar order
    pub fn widgets(&self) -> Vec<ToggleWidget<dyn Toggleable>> {
        let theme = self.theme();
        let probe_config = self.probe_config();

        self.blocks
            .iter()
            .map(|block| {
                let interval = secs(block.interval_secs().unwrap_or(self.interval_secs));
                let source: Arc<dyn Toggleable> = match block {
                    Block::Service {
                        unit,
                        scope,
                        label,
                        icon,
                        ..
                    } => {
                        let mut service = SystemdService::new(unit.clone(), *scope, theme.clone())
                            .with_probe_config(probe_config.clone());
                        if let Some(label) = label {
                            service = service.with_label(label.clone());
                        }
                        if let Some(icon) = icon {
                            service = service.with_icon(icon.clone());
                        }
                        Arc::new(service)
                    }
                    Block::Toggle {
                        name,
                        mode,
                        probe_command,
                        probe_args,
                        on_state,
                        off_state,
                        icon,
                        ..
                    } => Arc::new(CommandToggle {
                        name: name.clone(),
                        probe_command: probe_command.clone(),
                        probe_args: probe_args.clone(),
                        on_state: on_state.clone(),
                        off_state: off_state.clone(),
                        mode: mode.clone(),
                        icon: icon.clone(),
                        theme: theme.clone(),
                        probe_config: probe_config.clone(),
                    }),
                };
                ToggleWidget::from_arc(source, interval)
            })
            .collect()
    }
}

impl Block {
    pub fn interval_secs(&self) -> Option<f64> {
        match self {
            Block::Service { interval_secs, .. } | Block::Toggle { interval_secs, .. } => {
                *interval_secs
            }
        }
    }
}

pub fn parse_config(yaml: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Loads the config at `path`, or the embedded default when `path` is `None`
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path))?;
            parse_config(&yaml).with_context(|| format!("invalid config file {}", path))
        }
        None => {
            tracing::info!("Using embedded configuration");
            parse_config(EMBEDDED_CONFIG).context("invalid embedded configuration")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    #[test]
    fn test_parse_config() {
        let yaml = r##"
theme:
  active: "#00ff00"
interval_secs: 10
probe_timeout_secs: 2.5
blocks:
  - type: service
    unit: tproxy
  - type: service
    unit: dhc-vpn.service
    scope: system
    label: vpn
    interval_secs: 1
  - type: toggle
    name: "WiFi"
    mode: single
    command: "nmcli"
    args: ["radio", "wifi", "toggle"]
    probe_command: "nmcli"
    probe_args: ["radio", "wifi"]
    on_state: enabled
    off_state: disabled
  - type: toggle
    name: "VPN"
    mode: separate
    on_command: "nmcli"
    on_args: ["connection", "up", "vpn"]
    off_command: "nmcli"
    off_args: ["connection", "down", "vpn"]
    probe_command: "sh"
    probe_args: ["-c", "nmcli -t connection show --active | grep -q vpn && echo on || echo off"]
"##;

        let config = parse_config(yaml).unwrap();
        assert_eq!(config.interval_secs, 10.0);
        assert_eq!(config.probe_timeout_secs, Some(2.5));
        assert_eq!(config.blocks.len(), 4);

        match &config.blocks[0] {
            Block::Service {
                unit, scope, label, ..
            } => {
                assert_eq!(unit, "tproxy");
                assert_eq!(*scope, Scope::User);
                assert!(label.is_none());
            }
            _ => panic!("Expected service block"),
        }

        match &config.blocks[1] {
            Block::Service {
                scope,
                label,
                interval_secs,
                ..
            } => {
                assert_eq!(*scope, Scope::System);
                assert_eq!(label.as_deref(), Some("vpn"));
                assert_eq!(*interval_secs, Some(1.0));
            }
            _ => panic!("Expected service block"),
        }

        match &config.blocks[2] {
            Block::Toggle {
                name,
                mode,
                on_state,
                off_state,
                ..
            } => {
                assert_eq!(name, "WiFi");
                assert_eq!(on_state, "enabled");
                assert_eq!(off_state, "disabled");
                match mode {
                    ToggleMode::Single { command, args } => {
                        assert_eq!(command, "nmcli");
                        assert_eq!(args.len(), 3);
                    }
                    _ => panic!("Expected single mode toggle"),
                }
            }
            _ => panic!("Expected toggle block"),
        }

        match &config.blocks[3] {
            Block::Toggle {
                mode,
                on_state,
                off_state,
                ..
            } => {
                assert_eq!(on_state, "on");
                assert_eq!(off_state, "off");
                match mode {
                    ToggleMode::Separate {
                        on_command,
                        off_args,
                        ..
                    } => {
                        assert_eq!(on_command, "nmcli");
                        assert_eq!(off_args[1], "down");
                    }
                    _ => panic!("Expected separate mode toggle"),
                }
            }
            _ => panic!("Expected toggle block"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("blocks: []").unwrap();
        assert_eq!(config.interval_secs, 5.0);
        assert!(config.probe_timeout_secs.is_none());
        assert!(config.probe_config().timeout.is_none());
        assert_eq!(config.theme(), Theme::default());
    }

    #[test]
    fn test_widgets_follow_block_order_and_intervals() {
        let yaml = r##"
interval_secs: 3
theme:
  unknown: "#123456"
blocks:
  - type: service
    unit: tproxy
  - type: service
    unit: dhc-vpn
    label: vpn
    interval_secs: 0
"##;
        let config = parse_config(yaml).unwrap();
        let widgets = config.widgets();

        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].label(), "tproxy");
        assert_eq!(widgets[0].interval(), Duration::from_secs(3));
        assert_eq!(widgets[1].label(), "vpn");
        assert_eq!(widgets[1].interval(), crate::widget::MIN_INTERVAL);

        let segment = widgets[0].render("");
        assert_eq!(segment.color.as_deref(), Some("#123456"));
        assert_eq!(config.theme().color(theme::UNKNOWN), Some("#123456"));
    }

    #[test]
    fn test_unknown_block_type_rejected() {
        let yaml = "blocks:\n  - type: battery\n";
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn test_embedded_config_parses() {
        let config = load_config(None).unwrap();
        assert!(!config.blocks.is_empty());
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config(Some("/nonexistent/service-bar.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
