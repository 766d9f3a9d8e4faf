//! Utterance pipeline
//!
//! Resolves every utterance's speaker up front, fans synthesis out over
//! spawned tasks (bounded by a semaphore), and joins the results back in
//! `sequence_index` order. Completion order never affects the output.
//!
//! The first failure observed aborts the whole run: outstanding tasks are
//! cancelled and no partial audio is returned.

use crate::audio::AudioBuffer;
use crate::error::SynthesisError;
use crate::script::{ScriptParser, Utterance};
use crate::speakers::{SpeakerId, SpeakerRegistry};
use crate::speech::SpeechService;
use crate::{Result, VvError};
use log::{debug, error, info};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// Result of one spawned synthesis task, tagged with its slot
type SlotResult = (usize, std::result::Result<AudioBuffer, SynthesisError>);

/// Aborts every held task when dropped
///
/// Covers both the fail-fast return and cancellation of `run` itself.
struct TaskGuard(Vec<JoinHandle<()>>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Orchestrates synthesis of a parsed script
pub struct Pipeline {
    service: Arc<dyn SpeechService>,
    registry: Arc<SpeakerRegistry>,
    max_concurrency: usize,
}

impl Pipeline {
    /// Create a pipeline allowing at most `max_concurrency` requests in flight
    pub fn new(
        service: Arc<dyn SpeechService>,
        registry: Arc<SpeakerRegistry>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            service,
            registry,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Resolve the speaker of every utterance, in order
    ///
    /// Fails on the first name the registry does not know.
    pub fn resolve_speakers(&self, utterances: &[Utterance]) -> Result<Vec<SpeakerId>> {
        utterances
            .iter()
            .map(|u| {
                self.registry
                    .resolve(&u.speaker_name)
                    .ok_or_else(|| VvError::SpeakerNotFound {
                        name: u.speaker_name.clone(),
                        index: u.sequence_index,
                    })
            })
            .collect()
    }

    /// Synthesize all utterances and concatenate them in script order
    pub async fn run(&self, mut utterances: Vec<Utterance>) -> Result<AudioBuffer> {
        let start = Instant::now();

        if utterances.is_empty() {
            return Err(VvError::EmptyInput);
        }

        utterances.sort_by_key(|u| u.sequence_index);
        let speakers = self.resolve_speakers(&utterances)?;
        let count = utterances.len();

        info!(
            "Synthesizing {} utterances (max {} concurrent)",
            count, self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let (tx, mut rx) = mpsc::channel::<SlotResult>(count);
        let mut tasks = TaskGuard(Vec::with_capacity(count));

        for (slot, (utterance, speaker)) in utterances.iter().zip(speakers).enumerate() {
            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let text = utterance.text.clone();

            tasks.0.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result = service.synthesize(&text, speaker).await;
                let _ = tx.send((slot, result)).await;
            }));
        }
        drop(tx);

        let mut slots: Vec<Option<AudioBuffer>> = (0..count).map(|_| None).collect();

        while let Some((slot, result)) = rx.recv().await {
            let utterance = &utterances[slot];
            match result {
                Ok(audio) => {
                    info!(
                        "Synthesized id={} ({} bytes)",
                        utterance.sequence_index,
                        audio.byte_len()
                    );
                    slots[slot] = Some(audio);
                }
                Err(e) => {
                    error!(
                        "Utterance id={} failed, cancelling remaining requests: {}",
                        utterance.sequence_index, e
                    );
                    // Dropping the guard aborts the siblings
                    return Err(e.for_utterance(utterance.sequence_index, &utterance.text));
                }
            }
        }

        // Every sender is gone, so every task has finished
        for handle in std::mem::take(&mut tasks.0) {
            handle
                .await
                .map_err(|e| VvError::Task(e.to_string()))?;
        }

        let mut buffers = Vec::with_capacity(count);
        for (slot, audio) in slots.into_iter().enumerate() {
            let audio = audio.ok_or_else(|| {
                VvError::Task(format!(
                    "no result for utterance id={}",
                    utterances[slot].sequence_index
                ))
            })?;
            buffers.push(audio);
        }

        debug!("Concatenating {} buffers", buffers.len());
        let output = AudioBuffer::concat(buffers)?.ok_or(VvError::EmptyInput)?;

        info!("Synthesis finished in {:.2} s", start.elapsed().as_secs_f64());
        Ok(output)
    }

    /// Parse a script, synthesize it and write the result to `output`
    ///
    /// `output` is only touched once synthesis has fully succeeded.
    pub async fn render(
        &self,
        parser: &ScriptParser,
        script: &str,
        output: &Path,
    ) -> Result<AudioBuffer> {
        let voice = self.run(parser.parse_str(script)).await?;
        voice.write_wav(output)?;
        Ok(voice)
    }
}
