//! The layout engine seam.
//!
//! A [`LayoutEngine`] turns a graph description into a [`Scene`] sized for a
//! container. Layout is asynchronous: the returned future may complete at any
//! later point, and the caller decides whether the result is still wanted
//! when it arrives.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use thiserror::Error;

use crate::{geometry::ContainerSize, scene::Scene};

/// Failure reported by a layout engine.
///
/// The `Display` output is the text shown to the user in place of the
/// diagram, so it carries the engine's own wording without decoration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The description could not be parsed.
    #[error("{message}")]
    Syntax {
        message: String,
        /// 1-based line of the offending token, when known.
        line: Option<usize>,
    },

    /// The description parsed but could not be laid out.
    #[error("{0}")]
    Engine(String),
}

impl LayoutError {
    pub fn syntax(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }
}

/// Computes a positioned scene from a graph description.
pub trait LayoutEngine {
    /// Starts laying out `description` for a container of `size`.
    ///
    /// A zero-sized container means the size is not known yet; engines should
    /// then produce the scene at its natural size.
    fn layout(
        &self,
        description: &str,
        size: ContainerSize,
    ) -> LocalBoxFuture<'static, Result<Scene, LayoutError>>;
}

impl<T: LayoutEngine + ?Sized> LayoutEngine for Rc<T> {
    fn layout(
        &self,
        description: &str,
        size: ContainerSize,
    ) -> LocalBoxFuture<'static, Result<Scene, LayoutError>> {
        (**self).layout(description, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_error_display_is_bare_message() {
        let err = LayoutError::syntax("syntax error in line 1 near '->'", Some(1));
        assert_eq!(err.to_string(), "syntax error in line 1 near '->'");
        assert_eq!(LayoutError::engine("boom").to_string(), "boom");
    }
}
