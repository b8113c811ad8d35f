//! Batch generation: one remote request per variant, strictly in sequence.
//!
//! Each variant runs a small retry state machine. Only rate-limit failures are
//! retried; every other failure is recorded and the run moves on. The run as a
//! whole fails only when no variant produced an artifact.

use crate::{
    config::{ApiKey, Config, CredentialConfig, RetryPolicy},
    error::{Result, StickerError},
    gemini::ImageGenerator,
    logger,
    models::{
        FailureKind, GeneratedArtifact, GenerationParameters, ImageGenerationRequest, Locale,
        RunEvent, RunSummary, Variant, VariantFailure,
    },
    prompt,
};
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Outcome of a single remote attempt for one variant.
enum AttemptOutcome {
    Produced(GeneratedArtifact),
    Retry(FailureKind),
    Failed(FailureKind),
}

pub struct BatchOrchestrator<G> {
    generator: Arc<G>,
    credentials: CredentialConfig,
    retry: RetryPolicy,
    model: String,
    locale: Locale,
}

impl<G> Clone for BatchOrchestrator<G> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            credentials: self.credentials.clone(),
            retry: self.retry.clone(),
            model: self.model.clone(),
            locale: self.locale,
        }
    }
}

impl<G: ImageGenerator> BatchOrchestrator<G> {
    pub fn new(generator: G, config: &Config) -> Self {
        Self::with_shared(Arc::new(generator), config)
    }

    pub fn with_shared(generator: Arc<G>, config: &Config) -> Self {
        Self {
            generator,
            credentials: config.credentials.clone(),
            retry: config.retry.clone(),
            model: config.gemini.model.clone(),
            locale: config.locale,
        }
    }

    /// Generates one image per variant, pushing each artifact to `on_artifact`
    /// as soon as it exists and ticking `on_progress(current, total)` before
    /// every variant's first request.
    pub async fn run<A, P>(
        &self,
        params: &GenerationParameters,
        variants: &[Variant],
        mut on_artifact: A,
        mut on_progress: P,
    ) -> Result<RunSummary>
    where
        A: FnMut(GeneratedArtifact),
        P: FnMut(usize, usize),
    {
        let api_key = self.credentials.resolve()?;
        let total = variants.len();
        let _timer = logger::timer(&format!("generation run ({} variants)", total));

        log::info!(
            "Starting {} run: {} variant(s), style {}, reference image: {}",
            params.mode,
            total,
            params.style,
            params.reference_image.is_some()
        );

        let mut summary = RunSummary {
            requested: total,
            ..Default::default()
        };

        for (index, variant) in variants.iter().enumerate() {
            on_progress(index + 1, total);

            let caption = prompt::resolve_caption(params, variant);
            let composed = prompt::compose(params, variant);
            let request = ImageGenerationRequest::square(self.model.as_str(), composed.parts);

            let mut attempt = 1;
            let result = loop {
                log::debug!(
                    "{} attempt {}/{}",
                    variant.display_name,
                    attempt,
                    self.retry.max_attempts
                );
                match self
                    .attempt(&api_key, &request, variant, &caption, params, &composed.text)
                    .await
                {
                    AttemptOutcome::Produced(artifact) => break Ok(artifact),
                    AttemptOutcome::Retry(_) if attempt < self.retry.max_attempts => {
                        let wait = self.retry.backoff_for(attempt);
                        log::warn!(
                            "{} hit a rate limit, retrying in {}ms",
                            variant.display_name,
                            wait.as_millis()
                        );
                        tokio::time::sleep(wait).await;
                        attempt += 1;
                    }
                    AttemptOutcome::Retry(kind) | AttemptOutcome::Failed(kind) => break Err(kind),
                }
            };

            match result {
                Ok(artifact) => {
                    log::info!("{} generated ({} bytes)", variant.display_name, artifact.image.len());
                    on_artifact(artifact);
                    summary.succeeded += 1;

                    if index + 1 < total {
                        tokio::time::sleep(self.retry.pacing_delay).await;
                    }
                }
                Err(kind) => {
                    let reason = kind.describe(self.locale);
                    log::error!("{} failed: {}", variant.display_name, reason);
                    summary
                        .failures
                        .push(VariantFailure::new(variant.display_name.as_str(), kind, reason));
                }
            }
        }

        if summary.succeeded == 0 && !summary.failures.is_empty() {
            return Err(StickerError::AggregateGeneration(summary.failures));
        }

        log::info!(
            "Run finished: {}/{} succeeded",
            summary.succeeded,
            summary.requested
        );
        Ok(summary)
    }

    async fn attempt(
        &self,
        api_key: &ApiKey,
        request: &ImageGenerationRequest,
        variant: &Variant,
        caption: &Option<String>,
        params: &GenerationParameters,
        prompt_text: &str,
    ) -> AttemptOutcome {
        let failure = match self.generator.generate(api_key, request).await {
            Ok(response) => match response.first_image() {
                Some(image) => {
                    return AttemptOutcome::Produced(GeneratedArtifact::new(
                        image,
                        variant.display_name.as_str(),
                        caption.clone(),
                        params.style,
                        prompt_text,
                    ))
                }
                None => FailureKind::NoContent,
            },
            Err(e) => {
                log::debug!("{} error: {}", variant.display_name, e);
                FailureKind::classify(&e)
            }
        };

        if failure.is_retriable() {
            AttemptOutcome::Retry(failure)
        } else {
            AttemptOutcome::Failed(failure)
        }
    }
}

impl<G: ImageGenerator + 'static> BatchOrchestrator<G> {
    /// Streaming form of [`run`](Self::run): events arrive as the run progresses
    /// and the stream ends after `Completed` or `Failed`.
    pub fn run_stream(
        &self,
        params: GenerationParameters,
        variants: Vec<Variant>,
    ) -> Pin<Box<dyn Stream<Item = RunEvent> + Send>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let orchestrator = self.clone();

        tokio::spawn(async move {
            let artifact_tx = tx.clone();
            let progress_tx = tx.clone();
            let outcome = orchestrator
                .run(
                    &params,
                    &variants,
                    |artifact| {
                        let _ = artifact_tx.send(RunEvent::Artifact(artifact));
                    },
                    |current, total| {
                        let _ = progress_tx.send(RunEvent::Progress { current, total });
                    },
                )
                .await;

            let last = match outcome {
                Ok(summary) => RunEvent::Completed(summary),
                Err(e) => RunEvent::Failed(e),
            };
            let _ = tx.send(last);
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}
