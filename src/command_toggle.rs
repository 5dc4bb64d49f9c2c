use crate::command::run_action;
use crate::config::ToggleMode;
use crate::probe::{execute_probe_command_with_config, ProbeConfig};
use crate::segment::{pango_span, Segment};
use crate::theme::{self, Theme};
use crate::widget::Toggleable;
use tracing::debug;

/// A toggle built from an arbitrary probe command and one or two action
/// commands. The probe's trimmed stdout is the state.
#[derive(Debug, Clone)]
pub struct CommandToggle {
    pub name: String,
    pub probe_command: String,
    pub probe_args: Vec<String>,
    pub on_state: String,
    pub off_state: String,
    pub mode: ToggleMode,
    pub icon: Option<String>,
    pub theme: Theme,
    pub probe_config: ProbeConfig,
}

impl CommandToggle {
    /// Picks the command to run for a click while in `state`
    pub fn action_for(&self, state: &str) -> (&str, &[String]) {
        match &self.mode {
            ToggleMode::Single { command, args } => (command.as_str(), args.as_slice()),
            ToggleMode::Separate {
                on_command,
                on_args,
                off_command,
                off_args,
            } => {
                if state == self.on_state {
                    (off_command.as_str(), off_args.as_slice())
                } else {
                    // Off or unknown: turn it on
                    (on_command.as_str(), on_args.as_slice())
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Toggleable for CommandToggle {
    fn label(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> String {
        execute_probe_command_with_config(
            &self.probe_command,
            &self.probe_args,
            &self.name,
            &self.probe_config,
        )
        .await
        .state()
    }

    async fn act(&self) {
        let current = match self.mode {
            ToggleMode::Single { .. } => String::new(),
            ToggleMode::Separate { .. } => self.probe().await,
        };
        let (command, args) = self.action_for(&current);
        debug!("Toggle '{}' is {:?}, running {}", self.name, current, command);
        run_action(command, args, &self.name).await;
    }

    fn render(&self, state: &str) -> Segment {
        let color = if state == self.on_state {
            self.theme.color(theme::ACTIVE)
        } else if state == self.off_state {
            self.theme.color(theme::INACTIVE)
        } else {
            self.theme.color(theme::UNKNOWN)
        };

        let label = pango_span(&self.name, color);
        let markup = match &self.icon {
            Some(icon) => format!("{} {}", pango_span(icon, self.theme.color(theme::ICON)), label),
            None => label,
        };

        Segment::pango(markup)
            .short_text(self.name.clone())
            .color(color)
            .name("toggle")
    }
}
