//! Host theme access.
//!
//! The diagram foreground follows a variable of the host theme. The variable
//! is resolved at the moment each render is post-processed, so a theme
//! switch is picked up by the next render.

use std::{cell::RefCell, collections::HashMap};

use log::trace;

use clickgraph_core::color::Color;

use crate::config::ThemeConfig;

/// Looks up theme variables in the host environment.
pub trait ThemeProvider {
    /// Resolves a variable such as `--vscode-editor-foreground`.
    fn resolve(&self, variable: &str) -> Option<Color>;
}

/// A theme backed by an in-memory table, updatable at runtime.
#[derive(Debug, Default)]
pub struct StaticTheme {
    variables: RefCell<HashMap<String, Color>>,
}

impl StaticTheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`StaticTheme::set`].
    pub fn with(self, variable: impl Into<String>, color: Color) -> Self {
        self.set(variable, color);
        self
    }

    pub fn set(&self, variable: impl Into<String>, color: Color) {
        self.variables.borrow_mut().insert(variable.into(), color);
    }

    pub fn remove(&self, variable: &str) -> Option<Color> {
        self.variables.borrow_mut().remove(variable)
    }
}

impl ThemeProvider for StaticTheme {
    fn resolve(&self, variable: &str) -> Option<Color> {
        self.variables.borrow().get(variable).copied()
    }
}

/// Produces the paint value for the foreground.
///
/// Resolution order: the host theme, the configured fallback, and finally a
/// CSS `var()` reference that the host stylesheet can still satisfy.
pub fn foreground_paint(theme: &dyn ThemeProvider, config: &ThemeConfig) -> String {
    let variable = config.foreground_variable();
    if let Some(color) = theme.resolve(variable) {
        return color.to_string();
    }
    match config.fallback_foreground() {
        Ok(Some(color)) => color.to_string(),
        Ok(None) => format!("var({variable})"),
        Err(err) => {
            trace!(err:%; "Ignoring invalid fallback foreground");
            format!("var({variable})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_variable_wins() {
        let theme = StaticTheme::new().with("--fg", Color::new("red").unwrap());
        let config = ThemeConfig::new("--fg", Some("blue".to_string()));
        assert_eq!(
            foreground_paint(&theme, &config),
            Color::new("red").unwrap().to_string()
        );
    }

    #[test]
    fn test_fallback_then_var() {
        let theme = StaticTheme::new();
        let with_fallback = ThemeConfig::new("--fg", Some("blue".to_string()));
        assert_eq!(
            foreground_paint(&theme, &with_fallback),
            Color::new("blue").unwrap().to_string()
        );
        let bare = ThemeConfig::new("--fg", None);
        assert_eq!(foreground_paint(&theme, &bare), "var(--fg)");
    }

    #[test]
    fn test_theme_change_is_seen() {
        let theme = StaticTheme::new();
        let config = ThemeConfig::new("--fg", None);
        assert_eq!(foreground_paint(&theme, &config), "var(--fg)");
        theme.set("--fg", Color::new("white").unwrap());
        assert_ne!(foreground_paint(&theme, &config), "var(--fg)");
        theme.remove("--fg");
        assert_eq!(foreground_paint(&theme, &config), "var(--fg)");
    }
}
