pub mod bar;
pub mod command;
pub mod command_toggle;
pub mod config;
pub mod probe;
pub mod segment;
pub mod state_store;
pub mod systemd;
pub mod theme;
pub mod widget;


pub use bar::{run_bar, ClickRouter, SlotSink};
pub use command_toggle::CommandToggle;
pub use config::{load_config, Block, Config, ToggleMode};
pub use probe::{execute_probe_command, execute_probe_command_with_config, ProbeConfig, ProbeResult};
pub use segment::{ClickEvent, ClickHandler, Segment, Sink};
pub use state_store::{StateStore, Subscription};
pub use systemd::{next_lifecycle_command, Scope, SystemdService};
pub use theme::Theme;
pub use widget::{ToggleWidget, Toggleable};
