//! Staged text generation over `rill_stream`
//!
//! A pipeline is a chain of black-box [`TextStage`]s, each turning an input
//! string into a stream of [`TextChunk`]s. Between stages the chunk stream is
//! collected into the next stage's input, so a generate→critique→refine
//! chain is one lazy composition: nothing runs until the final stream is
//! subscribed, and cancelling that subscription reaches whichever stage is
//! currently producing.

pub mod chunk;
pub mod orchestrator;
pub mod stage;

pub use chunk::TextChunk;
pub use orchestrator::StagedPipeline;
pub use stage::{FnStage, TextStage};
