//! Running a whole catalog.

use turntable_core::{
    AssetReference, AssetSource, BatchOptions, LoadFailurePolicy, ModelCatalog, OutputLayout,
    Result, TurntableError,
};

use crate::assets::AssetStore;
use crate::loader::ModelLoader;
use crate::sequencer::{CaptureReport, CaptureSequencer};
use crate::stage::Stage;
use crate::writer::{FrameWriter, WriteFailure, WriteSummary};

/// One captured model.
#[derive(Debug, Clone)]
pub struct ModelReport {
    /// Position in the catalog.
    pub index: usize,
    /// The catalog entry.
    pub reference: AssetReference,
    /// The finished shoot.
    pub capture: CaptureReport,
    /// The model's writes, all completed.
    pub writes: WriteSummary,
}

/// A model that failed to load and was skipped.
#[derive(Debug, Clone)]
pub struct SkippedModel {
    /// Position in the catalog.
    pub index: usize,
    /// The catalog entry.
    pub reference: AssetReference,
    /// Why it could not be loaded.
    pub reason: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Models captured, in catalog order.
    pub captured: Vec<ModelReport>,
    /// Models skipped after a load failure.
    pub skipped: Vec<SkippedModel>,
    /// Every frame that could not be written.
    pub write_failures: Vec<WriteFailure>,
}

impl BatchReport {
    /// Returns true if every model was captured and every frame written.
    pub fn is_success(&self) -> bool {
        self.skipped.is_empty() && self.write_failures.is_empty()
    }

    /// Number of frames that reached the disk.
    pub fn frames_written(&self) -> usize {
        self.captured.iter().map(|m| m.writes.written.len()).sum()
    }
}

/// Loads and captures every catalog entry in order.
pub struct BatchOrchestrator<S: AssetSource> {
    catalog: ModelCatalog,
    options: BatchOptions,
    loader: ModelLoader<S>,
}

impl<S: AssetSource> BatchOrchestrator<S> {
    /// Creates an orchestrator loading through `store`.
    pub fn new(catalog: ModelCatalog, options: BatchOptions, store: AssetStore<S>) -> Self {
        Self {
            catalog,
            options,
            loader: ModelLoader::new(store),
        }
    }

    /// The asset store models are loaded through.
    pub fn store(&self) -> &AssetStore<S> {
        self.loader.store()
    }

    /// Runs the batch on `stage`.
    ///
    /// Fails up front, before anything is loaded or written, if the catalog
    /// is empty or malformed. Every model's writes are drained before the
    /// next model is loaded. A load failure skips the model or ends the batch
    /// according to the configured [`LoadFailurePolicy`]; render and encode
    /// failures end the batch.
    pub async fn run<St: Stage + ?Sized>(&mut self, stage: &mut St) -> Result<BatchReport> {
        self.catalog.validate()?;

        let count = self.catalog.count();
        let mut layout = OutputLayout::new(self.options.output_root.clone());
        let mut writer = FrameWriter::new(self.options.max_pending_writes);
        let mut report = BatchReport::default();

        log::info!(
            "capturing {count} model(s) into {}",
            self.options.output_root.display()
        );

        for index in 0..count {
            match self.loader.load(stage, &self.catalog, index).await {
                Ok(name) => log::debug!("loaded {name}"),
                Err(TurntableError::Load { reference, source }) => {
                    match self.options.load_failure_policy {
                        LoadFailurePolicy::Skip => {
                            log::warn!("skipping {reference}: {source}");
                            report.skipped.push(SkippedModel {
                                index,
                                reference: self.reference_at(index),
                                reason: source.to_string(),
                            });
                            continue;
                        }
                        LoadFailurePolicy::Abort => {
                            log::error!("aborting batch: failed to load {reference}: {source}");
                            writer.drain().await;
                            return Err(TurntableError::Load { reference, source });
                        }
                    }
                }
                Err(e) => {
                    writer.drain().await;
                    return Err(e);
                }
            }

            let capture = match CaptureSequencer::new().run(stage, &mut layout, &mut writer).await {
                Ok(capture) => capture,
                Err(e) => {
                    log::error!("aborting batch: {e}");
                    writer.drain().await;
                    stage.scene_mut().despawn();
                    return Err(e);
                }
            };

            let writes = writer.drain().await;
            report.write_failures.extend(writes.failures.iter().cloned());
            report.captured.push(ModelReport {
                index,
                reference: self.reference_at(index),
                capture,
                writes,
            });
        }

        let summary = writer.drain().await;
        report.write_failures.extend(summary.failures);

        log::info!(
            "batch finished: {} captured, {} skipped, {} frame(s) written, {} write failure(s)",
            report.captured.len(),
            report.skipped.len(),
            report.frames_written(),
            report.write_failures.len()
        );
        Ok(report)
    }

    fn reference_at(&self, index: usize) -> AssetReference {
        self.catalog
            .reference_at(index)
            .cloned()
            .unwrap_or_else(|| AssetReference::new(format!("#{index}")))
    }
}
