//! Error adapter for converting ClickGraphError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! A syntax error that knows its line and carries the graph description is
//! rendered with a snippet of the offending line; everything else is
//! rendered as a plain diagnostic with a `clickgraph::*` code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use clickgraph::{ClickGraphError, layout::LayoutError};

/// Adapter for a DOT syntax error with a known source location.
pub struct SyntaxAdapter<'a> {
    message: &'a str,
    src: &'a str,
    span: SourceSpan,
}

impl<'a> SyntaxAdapter<'a> {
    /// Creates an adapter labelling `line` (1-based) of `src`.
    ///
    /// Returns `None` when `src` has no such line.
    pub fn new(message: &'a str, src: &'a str, line: usize) -> Option<Self> {
        let span = line_span(src, line)?;
        Some(Self { message, src, span })
    }
}

impl fmt::Debug for SyntaxAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxAdapter")
            .field("message", &self.message)
            .field("span", &self.span)
            .finish()
    }
}

impl fmt::Display for SyntaxAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for SyntaxAdapter<'_> {}

impl MietteDiagnostic for SyntaxAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("clickgraph::syntax"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("check the DOT statement on this line"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            self.span,
        ))))
    }
}

/// Adapter for [`ClickGraphError`] variants without source location.
pub struct ErrorAdapter<'a>(pub &'a ClickGraphError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            ClickGraphError::Io(_) => "clickgraph::io",
            ClickGraphError::Layout {
                err: LayoutError::Syntax { .. },
                ..
            } => "clickgraph::syntax",
            ClickGraphError::Layout { .. } => "clickgraph::layout",
            ClickGraphError::AlreadyMounted => "clickgraph::mount",
            ClickGraphError::Spawn(_) => "clickgraph::spawn",
            ClickGraphError::Render(_) => "clickgraph::render",
            ClickGraphError::Config(_) => "clickgraph::config",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A syntax error pointing into the graph description.
    Syntax(SyntaxAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Syntax(s) => fmt::Display::fmt(s, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Syntax(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Syntax(s) => s.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Syntax(s) => s.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Syntax(s) => s.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Syntax(s) => s.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Byte span of the 1-based `line` of `src`, without its line terminator.
fn line_span(src: &str, line: usize) -> Option<SourceSpan> {
    let mut offset = 0;
    for (index, text) in src.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let content = text.trim_end_matches(['\n', '\r']);
            return Some(SourceSpan::new(offset.into(), content.len()));
        }
        offset += text.len();
    }
    None
}

/// Convert a [`ClickGraphError`] into a reportable error.
pub fn to_reportable(err: &ClickGraphError) -> Reportable<'_> {
    let syntax = match err {
        ClickGraphError::Layout {
            err: LayoutError::Syntax {
                message,
                line: Some(line),
            },
            src: Some(src),
        } => SyntaxAdapter::new(message, src, *line),
        _ => None,
    };
    match syntax {
        Some(adapter) => Reportable::Syntax(adapter),
        None => Reportable::Error(ErrorAdapter(err)),
    }
}
