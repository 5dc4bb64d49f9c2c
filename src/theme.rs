use std::collections::BTreeMap;

pub const ACTIVE: &str = "active";
pub const INACTIVE: &str = "inactive";
pub const UNKNOWN: &str = "unknown";
pub const ICON: &str = "icon";

/// Color table mapping logical color names to i3bar color strings.
///
/// Built once at startup and shared read-only with every widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    colors: BTreeMap<String, String>,
}

impl Default for Theme {
    fn default() -> Self {
        let colors = [
            (ACTIVE, "#238555"),
            (INACTIVE, "#972822"),
            (UNKNOWN, "#ff7700"),
            (ICON, "#ffffff99"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
        Self { colors }
    }
}

impl Theme {
    /// Default table with `overrides` applied on top
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut theme = Self::default();
        for (name, value) in overrides {
            theme.colors.insert(name.clone(), value.clone());
        }
        theme
    }

    /// Looks up a color, falling back to the `unknown` entry
    pub fn color(&self, name: &str) -> Option<&str> {
        self.colors
            .get(name)
            .or_else(|| self.colors.get(UNKNOWN))
            .map(String::as_str)
    }
}
