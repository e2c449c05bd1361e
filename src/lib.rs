//! A handlebars-style templating engine.
//!
//! Templates are parsed into a flat list of [`Node`]s and rendered against a
//! [`serde_json::Value`] by an [`Engine`], which also holds the block helpers
//! and partials templates can refer to.
//!
//! ```
//! use serde_json::json;
//! use tagweave::Engine;
//!
//! let engine = Engine::new();
//! let output = engine
//!     .render(
//!         "{{#each people as person}}{{#if person.admin}}*{{/if}}{{person.name}} {{/each}}",
//!         &json!({"people": [{"name": "Al", "admin": true}, {"name": "Bo"}]}),
//!     )
//!     .unwrap();
//! assert_eq!(output, "*Al Bo ");
//! ```
mod ast;
mod config;
mod diagnostic;
mod engine;
mod error;
mod expr;
mod helpers;
mod interface;
mod parser;
mod partial;
mod template;
mod value;

// Public exports.
pub use ast::{Node, Span};
pub use config::Syntax;
pub use diagnostic::{Diagnostic, DiagnosticHandler};
pub use engine::Engine;
pub use error::{ParseError, ParseErrorKind, TagweaveError, TagweaveResult};
pub use interface::Helper;
pub use parser::parse;
pub use partial::PartialSource;
pub use serde_json::Value;
pub use template::Template;
pub use value::{escape_html, get_value, is_truthy, resolve, stringify};
