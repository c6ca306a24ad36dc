//! Error types for DOT layout.

use thiserror::Error;

use clickgraph_core::layout::LayoutError;

/// Result alias used throughout the DOT engine.
pub type Result<T> = std::result::Result<T, DotError>;

/// Errors raised while turning a DOT description into a scene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DotError {
    /// The description is not valid DOT.
    #[error("syntax error in line {}: {message}", display_line(.line))]
    Parse {
        message: String,
        line: Option<usize>,
    },

    /// Placement failed for a syntactically valid graph.
    #[error("layout failed: {0}")]
    Layout(String),
}

fn display_line(line: &Option<usize>) -> String {
    line.map_or_else(|| "?".to_string(), |line| line.to_string())
}

impl DotError {
    /// Builds a parse error from the parser's message, recovering the line
    /// number from its `--> line:column` location marker when present.
    pub fn from_parser_message(raw: &str) -> Self {
        let line = raw.lines().find_map(|text| {
            let location = text.trim_start().strip_prefix("-->")?.trim();
            location.split(':').next()?.trim().parse::<usize>().ok()
        });

        let message = raw
            .lines()
            .map(str::trim)
            .rev()
            .find(|text| {
                text.starts_with('=') || (!text.is_empty() && !text.starts_with('|'))
            })
            .map(|text| text.trim_start_matches('=').trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| raw.trim().to_string());

        Self::Parse { message, line }
    }
}

impl From<DotError> for LayoutError {
    fn from(err: DotError) -> Self {
        match &err {
            DotError::Parse { line, .. } => LayoutError::syntax(err.to_string(), *line),
            DotError::Layout(_) => LayoutError::engine(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEST_MESSAGE: &str = " --> 2:5\n  |\n2 | a -> ;\n  |     ^---\n  |\n  = expected vertex";

    #[test]
    fn test_from_parser_message_extracts_line() {
        let err = DotError::from_parser_message(PEST_MESSAGE);
        assert_eq!(
            err,
            DotError::Parse {
                message: "expected vertex".to_string(),
                line: Some(2),
            }
        );
        assert_eq!(err.to_string(), "syntax error in line 2: expected vertex");
    }

    #[test]
    fn test_from_parser_message_without_location() {
        let err = DotError::from_parser_message("unexpected end of input");
        assert_eq!(err.to_string(), "syntax error in line ?: unexpected end of input");
    }

    #[test]
    fn test_into_layout_error_keeps_text() {
        let err: LayoutError = DotError::Layout("no ranks".to_string()).into();
        assert_eq!(err.to_string(), "layout failed: no ranks");

        let err: LayoutError = DotError::from_parser_message(PEST_MESSAGE).into();
        assert!(matches!(err, LayoutError::Syntax { line: Some(2), .. }));
    }
}
