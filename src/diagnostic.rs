use std::fmt;

use crate::ast::Span;

/// A recoverable problem found while rendering.
///
/// Diagnostics never abort a render. Each one is logged through `tracing` at
/// `warn` level and handed to the handler installed with
/// [`Engine::set_diagnostic_handler`](crate::Engine::set_diagnostic_handler).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// The block was skipped along with its content.
    HelperNotFound { name: String, span: Span },
    /// The content enclosed by the partial tag was rendered instead.
    PartialNotFound { name: String, span: Span },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HelperNotFound { name, .. } => write!(f, "Helper \"{name}\" not found"),
            Self::PartialNotFound { name, .. } => write!(f, "Partial \"{name}\" not defined"),
        }
    }
}

pub type DiagnosticHandler = dyn Fn(&Diagnostic) + Send + Sync;
