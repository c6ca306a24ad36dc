//! Error types for clickgraph operations.
//!
//! This module provides the main error type [`ClickGraphError`] for the
//! operations that report failures to their caller.

use std::io;

use thiserror::Error;

use clickgraph_core::layout::LayoutError;

/// The main error type for clickgraph operations.
///
/// Layout failures inside a mounted controller never surface as this type;
/// they are shown as text in the container instead. A caller that wants to
/// report such a failure elsewhere wraps it with
/// [`ClickGraphError::new_layout_error`], keeping the description for
/// source snippets.
#[derive(Debug, Error)]
pub enum ClickGraphError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Layout { err: LayoutError, src: Option<String> },

    /// The controller is already mounted on a container.
    #[error("controller is already mounted")]
    AlreadyMounted,

    /// The render task could not be handed to the executor.
    #[error("failed to schedule render: {0}")]
    Spawn(String),

    /// A render finished without producing a scene.
    #[error("render produced no scene: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LayoutError> for ClickGraphError {
    fn from(err: LayoutError) -> Self {
        Self::Layout { err, src: None }
    }
}

impl ClickGraphError {
    /// Create a new `Layout` error with the graph description it came from.
    pub fn new_layout_error(err: LayoutError, src: impl Into<String>) -> Self {
        Self::Layout {
            err,
            src: Some(src.into()),
        }
    }
}
