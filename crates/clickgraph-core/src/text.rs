//! Label measurement.
//!
//! Layout engines need the rendered size of node and edge labels before they
//! can size shapes. [`TextStyle::measure`] shapes the text with cosmic-text
//! against a process-wide [`FontSystem`] and falls back to an average glyph
//! width estimate when no font produced any layout runs.

use std::sync::{Arc, Mutex, OnceLock};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::info;

use crate::geometry::Size;

/// Font settings used to measure and draw a label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    font_family: String,
    font_size: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new("Times,serif", 14.0)
    }
}

impl TextStyle {
    pub fn new(font_family: impl Into<String>, font_size: f32) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
        }
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Distance between the baselines of two consecutive lines.
    pub fn line_height(&self) -> f32 {
        self.font_size * 1.2
    }

    /// Measures the bounding size of a possibly multi-line label.
    ///
    /// Lines are separated by `\n`. An empty label measures as zero.
    pub fn measure(&self, text: &str) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        let manager = TEXT_MANAGER.get_or_init(TextManager::new);
        let width = text
            .lines()
            .map(|line| manager.line_width(line, self))
            .fold(0.0f32, f32::max);
        let line_count = text.lines().count().max(1);

        Size::new(width, self.line_height() * line_count as f32)
    }
}

/// Holds a reusable FontSystem instance to avoid expensive recreation
struct TextManager {
    font_system: Arc<Mutex<FontSystem>>,
}

impl TextManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Arc::new(Mutex::new(FontSystem::new())),
        }
    }

    /// Width in pixels of a single line shaped with cosmic-text.
    fn line_width(&self, line: &str, style: &TextStyle) -> f32 {
        if line.is_empty() {
            return 0.0;
        }

        let mut font_system = self
            .font_system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let metrics = Metrics::new(style.font_size(), style.line_height());
        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);

        // Graphviz style families list fallbacks ("Times,serif"); cosmic-text takes one name
        let family = style
            .font_family()
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or("serif");
        let attrs = Attrs::new().family(Family::Name(family));

        buffer.set_size(None, None);
        buffer.set_text(line, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let width = buffer
            .layout_runs()
            .filter_map(|run| run.glyphs.last().map(|glyph| glyph.x + glyph.w))
            .fold(0.0f32, f32::max);

        if width > 0.0 {
            width
        } else {
            line.chars().count() as f32 * style.font_size() * 0.55
        }
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();
