use crate::command::run_action;
use crate::probe::{execute_probe_command_with_config, ProbeConfig};
use crate::segment::{pango_span, Segment};
use crate::theme::{self, Theme};
use crate::widget::Toggleable;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SYSTEMCTL: &str = "systemctl";

/// Nerd Font glyph for mdi-arrow-decision
pub const DEFAULT_ICON: &str = "\u{f09bb}";

/// Which service manager instance to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    User,
    System,
}

/// Lifecycle verb that moves a unit away from `state`
pub fn next_lifecycle_command(state: &str) -> &'static str {
    match state {
        "active" => "stop",
        "inactive" => "start",
        _ => "restart",
    }
}

/// A systemd unit shown as a clickable on/off block
#[derive(Debug, Clone)]
pub struct SystemdService {
    unit: String,
    label: String,
    icon: String,
    scope: Scope,
    theme: Theme,
    probe_config: ProbeConfig,
}

impl SystemdService {
    pub fn new(unit: impl Into<String>, scope: Scope, theme: Theme) -> Self {
        let unit = unit.into();
        Self {
            label: unit.clone(),
            unit,
            icon: DEFAULT_ICON.to_string(),
            scope,
            theme,
            probe_config: ProbeConfig::default(),
        }
    }

    pub fn user(unit: impl Into<String>, theme: Theme) -> Self {
        Self::new(unit, Scope::User, theme)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_probe_config(mut self, probe_config: ProbeConfig) -> Self {
        self.probe_config = probe_config;
        self
    }

    /// Arguments for `systemctl <verb> <unit>` in this service's scope
    pub fn systemctl_args(&self, verb: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if self.scope == Scope::User {
            args.push("--user".to_string());
        }
        args.push(verb.to_string());
        args.push(self.unit.clone());
        args
    }
}

#[async_trait::async_trait]
impl Toggleable for SystemdService {
    fn label(&self) -> &str {
        &self.label
    }

    async fn probe(&self) -> String {
        execute_probe_command_with_config(
            SYSTEMCTL,
            &self.systemctl_args("is-active"),
            &self.label,
            &self.probe_config,
        )
        .await
        .state()
    }

    async fn act(&self) {
        let current = self.probe().await;
        let verb = next_lifecycle_command(&current);
        debug!("Unit '{}' is {:?}, sending {}", self.unit, current, verb);
        run_action(SYSTEMCTL, &self.systemctl_args(verb), &self.label).await;
    }

    fn render(&self, state: &str) -> Segment {
        let color = match state {
            "active" => self.theme.color(theme::ACTIVE),
            "inactive" => self.theme.color(theme::INACTIVE),
            _ => self.theme.color(theme::UNKNOWN),
        };
        let markup = format!(
            "{} {}",
            pango_span(&self.icon, self.theme.color(theme::ICON)),
            pango_span(&self.label, color)
        );

        Segment::pango(markup)
            .short_text(self.label.clone())
            .color(color)
            .name("service")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_lifecycle_command() {
        assert_eq!(next_lifecycle_command("active"), "stop");
        assert_eq!(next_lifecycle_command("inactive"), "start");
        assert_eq!(next_lifecycle_command("failed"), "restart");
        assert_eq!(next_lifecycle_command("activating"), "restart");
        assert_eq!(next_lifecycle_command(""), "restart");
    }

    #[test]
    fn test_systemctl_args_by_scope() {
        let user = SystemdService::user("tproxy", Theme::default());
        assert_eq!(user.systemctl_args("is-active"), vec!["--user", "is-active", "tproxy"]);

        let system = SystemdService::new("sshd", Scope::System, Theme::default());
        assert_eq!(system.systemctl_args("start"), vec!["start", "sshd"]);
    }

    #[test]
    fn test_render_colors_by_state() {
        let colors = Theme::default();
        let service = SystemdService::user("tproxy", colors.clone());

        let active = service.render("active");
        assert_eq!(active.color.as_deref(), colors.color(theme::ACTIVE));
        assert!(active.full_text.contains("tproxy"));

        let inactive = service.render("inactive");
        assert_eq!(inactive.color.as_deref(), colors.color(theme::INACTIVE));

        for state in ["", "failed", "garbage\nvalue"] {
            let other = service.render(state);
            assert_eq!(other.color.as_deref(), colors.color(theme::UNKNOWN));
        }
    }

    #[test]
    fn test_render_uses_label_and_icon() {
        let service = SystemdService::user("dhc-vpn.service", Theme::default())
            .with_label("vpn")
            .with_icon("V");

        let segment = service.render("active");
        assert_eq!(segment.markup.as_deref(), Some("pango"));
        assert_eq!(segment.short_text.as_deref(), Some("vpn"));
        assert_eq!(segment.name.as_deref(), Some("service"));
        assert!(segment.full_text.contains(">V</span>"));
        assert!(segment.full_text.contains(">vpn</span>"));
        assert!(!segment.full_text.contains("dhc-vpn"));
    }

    #[tokio::test]
    async fn test_probe_of_missing_unit_never_fails() {
        // Whatever systemctl reports (or fails to) must come back as a plain string
        let service = SystemdService::user("service-bar-test-nonexistent-unit", Theme::default());
        let state = service.probe().await;
        assert_ne!(state, "active");
    }
}
