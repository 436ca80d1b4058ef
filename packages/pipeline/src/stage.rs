//! Stage abstraction: a black box from input text to a chunk stream

use rill_stream::Stream;

use crate::chunk::TextChunk;

/// One step of a staged pipeline.
///
/// `run` must be cheap: it returns a lazy recipe, and production starts only
/// when the pipeline's output stream is subscribed. A stage is invoked once
/// per upstream input, with the collected output of the previous stage.
pub trait TextStage: Send + Sync {
    fn run(&self, input: &str) -> Stream<TextChunk>;
}

/// Closure adapter for [`TextStage`].
pub struct FnStage<F> {
    f: F,
}

impl<F> FnStage<F>
where
    F: Fn(&str) -> Stream<TextChunk> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> TextStage for FnStage<F>
where
    F: Fn(&str) -> Stream<TextChunk> + Send + Sync,
{
    fn run(&self, input: &str) -> Stream<TextChunk> {
        (self.f)(input)
    }
}
