//! Slack markup parsing.
//!
//! Turns Slack's lightweight markup into a node sequence that the renderers
//! in `format` consume once entities are resolved.

pub mod ast;
pub mod escape;
pub mod parser;
pub mod spans;
pub mod tag;
pub mod tokens;

pub use ast::{EntityRef, Markup, Node};
pub use parser::MarkupParser;
pub use spans::{ProtectedSpan, ProtectedSpans};
