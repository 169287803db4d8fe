//! # vox-agent
//!
//! The command-interpretation pipeline.
//!
//! Free-form user text goes in; a validated [`vox_core::ParsedReply`] comes
//! out, always — upstream failures degrade into apologetic replies instead of
//! propagating. The pipeline stages:
//!
//! - [`prompt`]: turn a command + persona + recent history into one
//!   instruction block
//! - [`vox_llm`]: obtain raw model text (owned by the `vox-llm` crate)
//! - [`extract`]: recover the structured reply from raw model text
//! - [`cache`]: memoize extracted replies per normalized command
//! - [`interpreter`]: the orchestrator tying the stages together, with
//!   short-circuit phrases, model fallback, calendar overrides, and
//!   fire-and-forget history persistence

#![deny(unsafe_code)]

pub mod cache;
pub mod extract;
pub mod interpreter;
pub mod prompt;

pub use cache::{Clock, ReplyCache, SystemClock};
pub use extract::extract_reply;
pub use interpreter::{
    AskRequest, Interpretation, InterpretError, Interpreter, PublicPersona, PublicReply,
    ReplySource,
};
pub use prompt::build_prompt;
