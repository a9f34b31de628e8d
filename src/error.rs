//! Structured error types for the Triptych layout engine.
//!
//! Four variants cover the real failure sources: storyboard JSON parsing,
//! canvas construction, height estimation, and unresolvable overflow.

use thiserror::Error;

/// The unified error type returned by all public Triptych API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Storyboard JSON failed to parse as a valid balance request.
    #[error("failed to parse storyboard: {source}{hint}")]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// Canvas construction violated positivity or aspect-ratio constraints.
    /// Rejected before any balancing begins.
    #[error("invalid canvas dimensions: {0}")]
    InvalidDimension(String),

    /// An element's height could not be estimated (no body text and no
    /// resolvable aspect ratio). The whole run aborts rather than placing
    /// a zero-size element.
    #[error("cannot estimate height for element '{element}': {reason}")]
    Estimation { element: String, reason: String },

    /// Overflow could not be resolved within the retry budget. Terminal for
    /// the run; reports the minimal overflow amount and the elements that
    /// extend past column capacity so a caller can intervene.
    #[error(
        "layout infeasible: {overflow:.2}in of content cannot fit after all \
         resolution attempts (overflowing elements: {})",
        .elements.join(", ")
    )]
    LayoutInfeasible { overflow: f64, elements: Vec<String> },
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "\n  Hint: check for trailing commas, missing quotes, or unescaped characters."
            }
            serde_json::error::Category::Data => {
                "\n  Hint: the JSON is valid but doesn't match the storyboard schema. Check field names and types."
            }
            serde_json::error::Category::Eof => {
                "\n  Hint: unexpected end of input — is the JSON truncated?"
            }
            serde_json::error::Category::Io => "",
        };
        LayoutError::Parse {
            source: e,
            hint: hint.to_string(),
        }
    }
}
