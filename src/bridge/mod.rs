//! The Slack-Matrix bridge pipeline.
//!
//! ## Module Structure
//!
//! - `echo`: Echo tagging and the self-authored message policy
//! - `orchestrator`: Main bridge orchestrator (`Bridge` struct)

pub mod echo;
pub mod orchestrator;

pub use echo::{EchoTagger, EchoVerdict, ECHO_TAG};
pub use orchestrator::Bridge;
