//! The render pipeline.
//!
//! Stages run in a fixed order: fetch source, fetch overlay audio, cut each
//! segment, concatenate (with overlays), publish. Any stage failure skips the
//! rest. Cleanup of the job's temp files runs on every path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use vrender_media::{
    extension_from_url, write_concat_manifest, ConcatOverlay, HttpFetcher, Transcoder,
};
use vrender_models::{total_duration, RenderJob};
use vrender_queue::JobStore;
use vrender_storage::{render_output_key, ObjectStore, VIDEO_CONTENT_TYPE};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::progress::{
    segment_span, ProgressReporter, AUDIO_FETCHED, CONCATENATED, SEGMENTS_CUT, SOURCE_FETCHED,
};
use crate::scratch::JobScratch;

/// Drives one job through every stage.
pub struct RenderPipeline {
    transcoder: Arc<dyn Transcoder>,
    fetcher: HttpFetcher,
    storage: Arc<dyn ObjectStore>,
    scratch_root: PathBuf,
    key_prefix: String,
}

impl RenderPipeline {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        fetcher: HttpFetcher,
        storage: Arc<dyn ObjectStore>,
        scratch_root: impl Into<PathBuf>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            transcoder,
            fetcher,
            storage,
            scratch_root: scratch_root.into(),
            key_prefix: key_prefix.into(),
        }
    }

    pub fn transcoder_name(&self) -> &str {
        self.transcoder.name()
    }

    pub fn storage_name(&self) -> &str {
        self.storage.name()
    }

    /// Render `job` and return the public URL of the output.
    ///
    /// Progress checkpoints are written to `store` as stages finish; the
    /// caller records the terminal status.
    pub async fn run(&self, job: &RenderJob, store: Arc<JobStore>) -> WorkerResult<String> {
        let logger = JobLogger::new(&job.id);
        let reporter = ProgressReporter::new(store, job.id.clone());
        let mut scratch = JobScratch::new(&self.scratch_root, &job.id);

        let result = self
            .run_stages(job, &reporter, &mut scratch, &logger)
            .instrument(logger.span())
            .await;

        let started = Instant::now();
        for warning in scratch.cleanup().await {
            logger.warning(&warning.to_string());
        }
        metrics::record_stage_duration("cleanup", started.elapsed().as_secs_f64());

        result
    }

    async fn run_stages(
        &self,
        job: &RenderJob,
        reporter: &ProgressReporter,
        scratch: &mut JobScratch,
        logger: &JobLogger,
    ) -> WorkerResult<String> {
        scratch.prepare().await?;

        // 1. Source
        let started = Instant::now();
        let source = scratch.track(format!("source.{}", extension_from_url(&job.source_url)));
        let bytes = self
            .fetcher
            .fetch_to_file(&job.source_url, &source)
            .await
            .map_err(|e| WorkerError::fetch("source", &e))?;
        metrics::record_stage_duration("fetch_source", started.elapsed().as_secs_f64());
        reporter.set(SOURCE_FETCHED);
        logger.stage("fetch_source", &format!("fetched source ({} bytes)", bytes));

        // 2. Overlay audio
        let audio = match job.options.audio_url.as_deref() {
            Some(audio_url) => {
                let started = Instant::now();
                let path = scratch.track(format!("audio.{}", extension_from_url(audio_url)));
                self.fetcher
                    .fetch_to_file(audio_url, &path)
                    .await
                    .map_err(|e| WorkerError::fetch("audio", &e))?;
                metrics::record_stage_duration("fetch_audio", started.elapsed().as_secs_f64());
                reporter.set(AUDIO_FETCHED);
                logger.stage("fetch_audio", "fetched overlay audio");
                Some(path)
            }
            None => None,
        };

        // 3. Segments, strictly in order
        let started = Instant::now();
        let count = job.segments.len();
        let mut clips = Vec::with_capacity(count);
        for (index, segment) in job.segments.iter().enumerate() {
            let (from, to) = segment_span(index, count);
            let clip = scratch.track(format!("segment_{:03}.mp4", index));
            self.transcoder
                .cut_segment(&source, segment, &clip, reporter.span(from, to, segment.duration()))
                .await
                .map_err(|e| WorkerError::transcode(&format!("segment {}", index + 1), &e))?;
            reporter.set(to);
            clips.push(clip);
        }
        metrics::record_stage_duration("cut", started.elapsed().as_secs_f64());
        reporter.set(SEGMENTS_CUT);
        logger.stage("cut", &format!("cut {} segment(s)", count));

        // 4. Concat with overlays
        let started = Instant::now();
        let manifest = scratch.track("concat.txt");
        write_concat_manifest(&manifest, &clips)
            .await
            .map_err(|e| WorkerError::transcode("concat manifest", &e))?;
        let output = scratch.track("output.mp4");
        let overlay = ConcatOverlay {
            audio,
            title: job.options.title.clone(),
        };
        let expected = total_duration(&job.segments);
        self.transcoder
            .concat(
                &manifest,
                &overlay,
                &output,
                reporter.span(SEGMENTS_CUT, CONCATENATED, expected),
            )
            .await
            .map_err(|e| WorkerError::transcode("concat", &e))?;
        metrics::record_stage_duration("concat", started.elapsed().as_secs_f64());
        reporter.set(CONCATENATED);

        match self.transcoder.inspect(&output).await {
            Ok(info) => {
                let detail = format!(
                    "output is {:.2}s (expected {:.2}s), {}x{} {}, audio: {}, {} bytes",
                    info.duration,
                    expected,
                    info.width,
                    info.height,
                    info.codec,
                    info.has_audio,
                    info.size
                );
                logger.stage("concat", &detail);
            }
            Err(e) => logger.warning(&format!("could not inspect output: {}", e)),
        }

        // 5. Publish
        let started = Instant::now();
        let key = render_output_key(&self.key_prefix, &job.id);
        let url = self
            .storage
            .put_file(&output, &key, VIDEO_CONTENT_TYPE)
            .await
            .map_err(|e| WorkerError::publish(&e))?;
        metrics::record_stage_duration("publish", started.elapsed().as_secs_f64());
        logger.stage("publish", &format!("published {}", key));

        Ok(url)
    }
}
