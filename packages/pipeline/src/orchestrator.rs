//! Chaining stages into one lazy stream

use std::sync::Arc;

use rill_stream::{IntoStream, Stream};

use crate::chunk::TextChunk;
use crate::stage::{FnStage, TextStage};

/// Ordered chain of [`TextStage`]s.
///
/// Each stage boundary collects the previous stage's chunks into a single
/// string and feeds it to the next stage, so later stages see complete text
/// rather than partial chunks. The chain is assembled eagerly but runs
/// lazily: subscribing the stream returned by [`run`](StagedPipeline::run)
/// is what triggers the first stage.
#[derive(Default)]
pub struct StagedPipeline {
    stages: Vec<Arc<dyn TextStage>>,
}

impl StagedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: impl TextStage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append a closure stage.
    pub fn fn_stage(
        self,
        f: impl Fn(&str) -> Stream<TextChunk> + Send + Sync + 'static,
    ) -> Self {
        self.stage(FnStage::new(f))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Wire the stages into one chunk stream seeded with `prompt`.
    ///
    /// An empty pipeline is the identity: a single chunk carrying the prompt.
    pub fn run(&self, prompt: &str) -> Stream<TextChunk> {
        let mut stages = self.stages.iter();
        let Some(first) = stages.next() else {
            return Stream::from_items(vec![TextChunk::from(prompt)]);
        };
        log::debug!(
            "pipeline: {} stages, prompt of {} chars",
            self.stages.len(),
            prompt.len()
        );
        let mut current = first.run(prompt);
        for (offset, stage) in stages.enumerate() {
            let stage = Arc::clone(stage);
            let boundary = offset + 1;
            current = current
                .collect_to_string("")
                .into_stream()
                .concat_map(move |text: String| {
                    log::debug!("pipeline: stage {boundary} input of {} chars", text.len());
                    stage.run(&text)
                });
        }
        current
    }
}
