//! Configuration types for clickgraph rendering.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every section and field has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and theme settings.
//! - [`LayoutConfig`] - Fonts and spacing handed to the DOT layout engine.
//! - [`ThemeConfig`] - Which host theme variable paints the foreground, and its fallback.
//!
//! # Example
//!
//! ```
//! # use clickgraph::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.theme().foreground_variable(), "--vscode-editor-foreground");
//! assert!(config.theme().fallback_foreground().is_ok());
//! ```

use serde::Deserialize;

use clickgraph_core::{color::Color, text::TextStyle};
use clickgraph_dot::LayoutOptions;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Theme configuration section.
    #[serde(default)]
    theme: ThemeConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig, theme: ThemeConfig) -> Self {
        Self { layout, theme }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the theme configuration.
    pub fn theme(&self) -> &ThemeConfig {
        &self.theme
    }
}

/// Fonts and spacing used by the DOT layout engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    font_family: String,
    font_size: f32,
    node_spacing: f32,
    rank_spacing: f32,
    margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let options = LayoutOptions::default();
        Self {
            font_family: options.text.font_family().to_string(),
            font_size: options.text.font_size(),
            node_spacing: options.node_spacing,
            rank_spacing: options.rank_spacing,
            margin: options.margin,
        }
    }
}

impl LayoutConfig {
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    pub fn rank_spacing(&self) -> f32 {
        self.rank_spacing
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Converts the section into engine options.
    pub fn to_options(&self) -> LayoutOptions {
        LayoutOptions {
            text: TextStyle::new(self.font_family.clone(), self.font_size),
            node_spacing: self.node_spacing,
            rank_spacing: self.rank_spacing,
            margin: self.margin,
        }
    }
}

/// Host theme integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Theme variable that supplies the diagram foreground.
    foreground_variable: String,

    /// Colour used when the host does not resolve the variable, as a color string.
    fallback_foreground: Option<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            foreground_variable: "--vscode-editor-foreground".to_string(),
            fallback_foreground: None,
        }
    }
}

impl ThemeConfig {
    pub fn new(foreground_variable: impl Into<String>, fallback_foreground: Option<String>) -> Self {
        Self {
            foreground_variable: foreground_variable.into(),
            fallback_foreground,
        }
    }

    pub fn foreground_variable(&self) -> &str {
        &self.foreground_variable
    }

    /// Returns the parsed fallback [`Color`], or `None` if none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn fallback_foreground(&self) -> Result<Option<Color>, String> {
        self.fallback_foreground
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid fallback foreground in config: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.layout().font_family(), "Times,serif");
        assert_approx_eq!(f32, config.layout().font_size(), 14.0);
        assert_approx_eq!(f32, config.layout().node_spacing(), 18.0);
        assert_approx_eq!(f32, config.layout().rank_spacing(), 36.0);
        assert_approx_eq!(f32, config.layout().margin(), 4.0);
        assert_eq!(config.theme().fallback_foreground(), Ok(None));
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r##"
            [layout]
            rank_spacing = 50.0

            [theme]
            fallback_foreground = "#d4d4d4"
            "##,
        )
        .unwrap();
        assert_approx_eq!(f32, config.layout().rank_spacing(), 50.0);
        assert_approx_eq!(f32, config.layout().node_spacing(), 18.0);
        assert_eq!(
            config.theme().foreground_variable(),
            "--vscode-editor-foreground"
        );
        assert!(config.theme().fallback_foreground().unwrap().is_some());
    }

    #[test]
    fn test_invalid_fallback() {
        let theme = ThemeConfig::new("--fg", Some("not-a-colour".to_string()));
        assert!(theme.fallback_foreground().is_err());
    }

    #[test]
    fn test_to_options() {
        let options = LayoutConfig::default().to_options();
        assert_eq!(options, LayoutOptions::default());
    }
}
