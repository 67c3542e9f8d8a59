//! Worker loop tests with a fake transcoder and an in-memory object store.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vrender_media::{
    ConcatOverlay, FfmpegProgress, HttpFetcher, MediaError, MediaResult, ProgressCallback,
    Transcoder, VideoInfo,
};
use vrender_models::{JobId, JobStatus, RenderJob, RenderOptions, Segment};
use vrender_queue::{JobStore, JobUpdate, UpdateOutcome};
use vrender_storage::{ObjectStore, StorageError, StorageResult};
use vrender_worker::{RenderPipeline, RenderWorker, WorkerHandle};

#[derive(Default)]
struct FakeTranscoder {
    delay: Duration,
    fail_concat: bool,
    /// Zero-based index of the cut that fails
    fail_cut_at: Option<usize>,
    /// Job directory of every cut, in call order
    cuts: Mutex<Vec<String>>,
    overlays: Mutex<Vec<ConcatOverlay>>,
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn cut_segment(
        &self,
        source: &Path,
        segment: &Segment,
        output: &Path,
        progress: ProgressCallback,
    ) -> MediaResult<()> {
        assert!(source.exists(), "source must be fetched before cutting");
        let job_dir = source
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let index = {
            let mut cuts = self.cuts.lock().unwrap();
            cuts.push(job_dir);
            cuts.len() - 1
        };

        tokio::time::sleep(self.delay).await;
        if self.fail_cut_at == Some(index) {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Invalid argument".to_string()),
                Some(234),
            ));
        }
        progress(FfmpegProgress {
            out_time_ms: (segment.duration() * 500.0) as i64,
            ..Default::default()
        });
        progress(FfmpegProgress {
            is_complete: true,
            ..Default::default()
        });
        tokio::fs::write(output, b"clip").await?;
        Ok(())
    }

    async fn concat(
        &self,
        manifest: &Path,
        overlay: &ConcatOverlay,
        output: &Path,
        _progress: ProgressCallback,
    ) -> MediaResult<()> {
        self.overlays.lock().unwrap().push(overlay.clone());
        if self.fail_concat {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Invalid data found when processing input".to_string()),
                Some(1),
            ));
        }
        let listing = tokio::fs::read_to_string(manifest).await?;
        assert!(listing.starts_with("file '"));
        tokio::fs::write(output, b"output").await?;
        Ok(())
    }

    async fn inspect(&self, path: &Path) -> MediaResult<VideoInfo> {
        Ok(VideoInfo {
            duration: 4.0,
            width: 1280,
            height: 720,
            codec: "h264".to_string(),
            has_audio: true,
            size: tokio::fs::metadata(path).await?.len(),
        })
    }
}

#[derive(Default)]
struct MemoryStore {
    fail: bool,
    /// Report success without a URL
    empty_url: bool,
    keys: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put_file(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<String> {
        if self.fail {
            return Err(StorageError::upload_failed("bucket unavailable"));
        }
        assert!(path.exists());
        self.keys.lock().unwrap().push(key.to_string());
        if self.empty_url {
            return Ok(String::new());
        }
        Ok(format!("https://cdn.test/{}", key))
    }

    async fn check(&self) -> StorageResult<()> {
        Ok(())
    }
}

struct Harness {
    store: Arc<JobStore>,
    handle: WorkerHandle,
    scratch: TempDir,
    server: MockServer,
    task: JoinHandle<()>,
}

impl Harness {
    async fn start(transcoder: Arc<dyn Transcoder>, storage: Arc<dyn ObjectStore>) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/in.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 1024]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/music.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 512]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.mp3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::new());
        let pipeline = Arc::new(RenderPipeline::new(
            transcoder,
            HttpFetcher::new(5).unwrap(),
            storage,
            scratch.path(),
            "renders",
        ));
        let worker = RenderWorker::new(Arc::clone(&store), pipeline);
        let handle = worker.handle();
        let task = tokio::spawn(worker.run());

        Self {
            store,
            handle,
            scratch,
            server,
            task,
        }
    }

    fn url(&self, file: &str) -> String {
        format!("{}/{}", self.server.uri(), file)
    }

    fn submit(&self, source_url: &str, segments: Vec<Segment>, options: RenderOptions) -> JobId {
        let id = self.store.create(source_url, segments, options).unwrap();
        self.handle.try_advance();
        id
    }

    async fn wait_terminal(&self, id: &JobId) -> RenderJob {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let job = self.store.get(id).unwrap();
                if job.is_terminal() {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("job did not finish")
    }

    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }

    async fn stop(self) {
        self.handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .unwrap()
            .unwrap();
    }
}

fn one_segment() -> Vec<Segment> {
    vec![Segment::new(0.0, 1.0)]
}

#[tokio::test]
async fn test_job_completes_and_publishes() {
    let transcoder = Arc::new(FakeTranscoder::default());
    let storage = Arc::new(MemoryStore::default());
    let h = Harness::start(transcoder.clone(), storage.clone()).await;

    let id = h.submit(
        &h.url("in.mp4"),
        vec![Segment::new(0.0, 2.0), Segment::new(5.0, 7.0)],
        RenderOptions::default().with_title("Highlights"),
    );
    let job = h.wait_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(
        job.final_url.as_deref(),
        Some(format!("https://cdn.test/renders/{}/output.mp4", id).as_str())
    );
    assert!(job.error.is_none());
    assert_eq!(transcoder.cuts.lock().unwrap().len(), 2);
    assert_eq!(
        transcoder.overlays.lock().unwrap()[0].title.as_deref(),
        Some("Highlights")
    );
    assert_eq!(h.scratch_entries(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_jobs_run_one_at_a_time_in_fifo_order() {
    let transcoder = Arc::new(FakeTranscoder {
        delay: Duration::from_millis(30),
        ..Default::default()
    });
    let h = Harness::start(transcoder.clone(), Arc::new(MemoryStore::default())).await;

    let ids: Vec<JobId> = (0..5)
        .map(|_| h.submit(&h.url("in.mp4"), one_segment(), RenderOptions::default()))
        .collect();

    let store = Arc::clone(&h.store);
    let sampler = tokio::spawn(async move {
        let mut max_processing = 0;
        loop {
            let counts = store.counts();
            max_processing = max_processing.max(counts.processing);
            if counts.completed + counts.error == counts.total {
                return max_processing;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    for id in &ids {
        assert_eq!(h.wait_terminal(id).await.status, JobStatus::Completed);
    }
    assert_eq!(sampler.await.unwrap(), 1);

    let order: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    assert_eq!(*transcoder.cuts.lock().unwrap(), order);
    h.stop().await;
}

#[tokio::test]
async fn test_unreachable_source_fails_and_cleans_up() {
    let transcoder = Arc::new(FakeTranscoder::default());
    let h = Harness::start(transcoder.clone(), Arc::new(MemoryStore::default())).await;

    let id = h.submit("http://127.0.0.1:1/in.mp4", one_segment(), RenderOptions::default());
    let job = h.wait_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    let message = job.error.unwrap();
    assert!(message.starts_with("Fetch failed: source"), "{}", message);
    assert!(job.final_url.is_none());
    assert!(job.progress < 100);
    assert!(transcoder.cuts.lock().unwrap().is_empty());
    assert_eq!(h.scratch_entries(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_missing_audio_is_fatal() {
    let transcoder = Arc::new(FakeTranscoder::default());
    let h = Harness::start(transcoder.clone(), Arc::new(MemoryStore::default())).await;

    let options = RenderOptions::default().with_audio_url(h.url("missing.mp3"));
    let id = h.submit(&h.url("in.mp4"), one_segment(), options);
    let job = h.wait_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error.unwrap().contains("HTTP 404"));
    assert!(transcoder.cuts.lock().unwrap().is_empty());
    assert_eq!(h.scratch_entries(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_audio_overlay_is_passed_to_concat() {
    let transcoder = Arc::new(FakeTranscoder::default());
    let h = Harness::start(transcoder.clone(), Arc::new(MemoryStore::default())).await;

    let options = RenderOptions::default().with_audio_url(h.url("music.mp3"));
    let id = h.submit(&h.url("in.mp4"), one_segment(), options);
    assert_eq!(h.wait_terminal(&id).await.status, JobStatus::Completed);

    let overlays = transcoder.overlays.lock().unwrap();
    let audio = overlays[0].audio.as_ref().unwrap();
    assert!(audio.ends_with("audio.mp3"));
    h.stop().await;
}

#[tokio::test]
async fn test_transcode_failure_marks_error() {
    let transcoder = Arc::new(FakeTranscoder {
        fail_concat: true,
        ..Default::default()
    });
    let storage = Arc::new(MemoryStore::default());
    let h = Harness::start(transcoder, storage.clone()).await;

    let id = h.submit(&h.url("in.mp4"), one_segment(), RenderOptions::default());
    let job = h.wait_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    let message = job.error.unwrap();
    assert!(message.starts_with("Transcode failed: concat"), "{}", message);
    assert!(message.contains("Invalid data found"));
    assert!(job.final_url.is_none());
    assert!(storage.keys.lock().unwrap().is_empty());
    assert_eq!(h.scratch_entries(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_failing_middle_segment_stops_the_job() {
    let transcoder = Arc::new(FakeTranscoder {
        fail_cut_at: Some(1),
        ..Default::default()
    });
    let storage = Arc::new(MemoryStore::default());
    let h = Harness::start(transcoder.clone(), storage.clone()).await;

    let segments = vec![
        Segment::new(0.0, 1.0),
        Segment::new(2.0, 3.0),
        Segment::new(4.0, 5.0),
    ];
    let id = h.submit(&h.url("in.mp4"), segments, RenderOptions::default());
    let job = h.wait_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    let message = job.error.unwrap();
    assert!(message.starts_with("Transcode failed: segment 2"), "{}", message);
    assert!(message.contains("Invalid argument"), "{}", message);
    assert!(job.final_url.is_none());
    // The third segment is never cut and concat never runs
    assert_eq!(transcoder.cuts.lock().unwrap().len(), 2);
    assert!(transcoder.overlays.lock().unwrap().is_empty());
    assert!(storage.keys.lock().unwrap().is_empty());
    assert_eq!(h.scratch_entries(), 0);
    h.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_hung_ffmpeg_times_out_and_frees_the_worker() {
    use std::os::unix::fs::PermissionsExt;
    use vrender_media::FfmpegTranscoder;

    let bin = tempfile::tempdir().unwrap();
    let ffmpeg = bin.path().join("ffmpeg");
    std::fs::write(&ffmpeg, "#!/bin/sh\nsleep 30\n").unwrap();
    std::fs::set_permissions(&ffmpeg, std::fs::Permissions::from_mode(0o755)).unwrap();

    let transcoder = Arc::new(FfmpegTranscoder::new(ffmpeg.clone(), "/nonexistent/ffprobe", 1));
    let h = Harness::start(transcoder, Arc::new(MemoryStore::default())).await;

    let first = h.submit(&h.url("in.mp4"), one_segment(), RenderOptions::default());
    let second = h.submit(&h.url("in.mp4"), one_segment(), RenderOptions::default());

    let job = h.wait_terminal(&first).await;
    assert_eq!(job.status, JobStatus::Error);
    let message = job.error.unwrap();
    assert!(message.starts_with("Transcode failed: segment 1"), "{}", message);
    assert!(message.contains("timed out"), "{}", message);

    // The slot is released, so the next job runs (and times out too)
    assert_eq!(h.wait_terminal(&second).await.status, JobStatus::Error);
    assert_eq!(h.scratch_entries(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_publish_without_url_marks_error() {
    let storage = Arc::new(MemoryStore {
        empty_url: true,
        ..Default::default()
    });
    let h = Harness::start(Arc::new(FakeTranscoder::default()), storage.clone()).await;

    let first = h.submit(&h.url("in.mp4"), one_segment(), RenderOptions::default());
    let second = h.submit(&h.url("in.mp4"), one_segment(), RenderOptions::default());
    let job = h.wait_terminal(&first).await;

    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error.as_deref(), Some("publish returned no URL"));
    assert!(job.final_url.is_none());
    assert!(job.progress < 100);
    assert_eq!(h.wait_terminal(&second).await.status, JobStatus::Error);
    assert_eq!(storage.keys.lock().unwrap().len(), 2);
    h.stop().await;
}

#[tokio::test]
async fn test_publish_failure_marks_error() {
    let storage = Arc::new(MemoryStore {
        fail: true,
        ..Default::default()
    });
    let h = Harness::start(Arc::new(FakeTranscoder::default()), storage).await;

    let id = h.submit(&h.url("in.mp4"), one_segment(), RenderOptions::default());
    let job = h.wait_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error.unwrap().starts_with("Publish failed"));
    assert!(job.final_url.is_none());
    assert_eq!(h.scratch_entries(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_progress_is_monotonic_and_terminal_is_stable() {
    let transcoder = Arc::new(FakeTranscoder {
        delay: Duration::from_millis(20),
        ..Default::default()
    });
    let h = Harness::start(transcoder, Arc::new(MemoryStore::default())).await;

    let segments = (0..4).map(|i| Segment::new(i as f64 * 3.0, i as f64 * 3.0 + 1.0)).collect();
    let id = h.submit(&h.url("in.mp4"), segments, RenderOptions::default());

    let mut observed = Vec::new();
    let job = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let job = h.store.get(&id).unwrap();
            observed.push(job.progress);
            if job.is_terminal() {
                return job;
            }
            if job.status == JobStatus::Processing {
                assert!(job.progress < 100);
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    assert!(observed.windows(2).all(|w| w[0] <= w[1]), "{:?}", observed);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);

    // Terminal jobs reject further updates
    assert_eq!(h.store.update(&id, JobUpdate::failed("late")), UpdateOutcome::Rejected);
    let again = h.store.get(&id).unwrap();
    assert_eq!(again.status, JobStatus::Completed);
    assert_eq!(again.final_url, job.final_url);
    h.stop().await;
}

#[tokio::test]
async fn test_worker_picks_up_jobs_queued_before_start() {
    let scratch = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 16]))
        .mount(&server)
        .await;

    let store = Arc::new(JobStore::new());
    let id = store
        .create(format!("{}/in.mp4", server.uri()), one_segment(), RenderOptions::default())
        .unwrap();

    let pipeline = Arc::new(RenderPipeline::new(
        Arc::new(FakeTranscoder::default()),
        HttpFetcher::new(5).unwrap(),
        Arc::new(MemoryStore::default()),
        scratch.path(),
        "renders",
    ));
    let worker = RenderWorker::new(Arc::clone(&store), pipeline);
    let handle = worker.handle();
    let task = tokio::spawn(worker.run());

    tokio::time::timeout(Duration::from_secs(10), async {
        while !store.get(&id).unwrap().is_terminal() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(store.get(&id).unwrap().status, JobStatus::Completed);
    assert!(!handle.is_busy());

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(!handle.is_running());
}
