//! Monitoring session coordinator.
//!
//! `PipelineCoordinator` wires a frame source, the sampling scheduler, a face
//! detector and the status reducer into one session:
//!
//! ```text
//! Uninitialized -> Starting -> Running -> Stopped
//!                     |
//!                     +-------> Failed
//! ```
//!
//! All coordinator state is mutated on the caller's thread. The detector runs
//! on one dedicated worker thread; every submitted frame carries its own
//! reply channel and the coordinator holds at most one pending reply, so at
//! most one detector call is ever in flight. Sampled frames that arrive while
//! a call is outstanding are dropped, not queued.
//!
//! `Stopped` and `Failed` are terminal. A new session needs a new coordinator.

use anyhow::{anyhow, bail, Context, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::detect::{DetectionResult, DetectorOptions, FaceDetector};
use crate::frame::CameraFrame;
use crate::gaze::{GazeClassifier, DEFAULT_GAZE_THRESHOLD};
use crate::ingest::{CameraError, FrameSource};
use crate::publish::{StatusHandle, StatusPublisher};
use crate::sampling::{SamplingScheduler, DEFAULT_SAMPLING_INTERVAL};
use crate::status::{self, MonitoringStatus};

pub const DEFAULT_DETECTOR_TIMEOUT: Duration = Duration::from_millis(2_000);
pub const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_millis(1_000);
pub const DEFAULT_MAX_READ_FAILURES: u32 = 30;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Per-session settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub sampling_interval: u32,
    pub gaze_threshold: f32,
    /// Handed to the detector backend untouched.
    pub detector: DetectorOptions,
    /// A detector call without a result by this deadline counts as a dropped frame.
    pub detector_timeout: Duration,
    /// How long teardown waits for the detector worker to close the model.
    pub release_timeout: Duration,
    /// Consecutive frame read failures tolerated before the session ends.
    pub max_read_failures: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            gaze_threshold: DEFAULT_GAZE_THRESHOLD,
            detector: DetectorOptions::default(),
            detector_timeout: DEFAULT_DETECTOR_TIMEOUT,
            release_timeout: DEFAULT_RELEASE_TIMEOUT,
            max_read_failures: DEFAULT_MAX_READ_FAILURES,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Starting,
    Running,
    Stopped,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Stopped | PipelineState::Failed)
    }
}

/// What happened to one delivered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDisposition {
    /// Counted, not due for detection.
    Skipped,
    /// Handed to the detector.
    Submitted,
    /// Due for detection, but a detector call was still outstanding.
    DroppedBusy,
    /// Due for detection, but the detector worker is gone.
    DetectorUnavailable,
    /// The session is not running.
    Ignored,
}

/// Session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_seen: u64,
    pub sampled: u64,
    pub submitted: u64,
    pub dropped_busy: u64,
    pub timeouts: u64,
    pub detector_errors: u64,
    pub results_processed: u64,
    pub read_failures: u64,
}

// ----------------------------------------------------------------------------
// Detector worker
// ----------------------------------------------------------------------------

type DetectionReply = Result<DetectionResult>;

struct DetectionJob {
    frame: CameraFrame,
    reply: Sender<DetectionReply>,
}

struct PendingDetection {
    reply: Receiver<DetectionReply>,
    sequence: u64,
    deadline: Instant,
    timed_out: bool,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Owns the detector on its own thread. A panic inside `detect` is reported
/// as a failed call and the worker keeps serving frames.
struct DetectorWorker {
    name: &'static str,
    jobs: Option<SyncSender<DetectionJob>>,
    done: Receiver<()>,
    join: Option<JoinHandle<()>>,
}

impl DetectorWorker {
    fn spawn(mut detector: Box<dyn FaceDetector>) -> Result<Self> {
        let name = detector.name();
        let (jobs_tx, jobs_rx) = mpsc::sync_channel::<DetectionJob>(1);
        let (done_tx, done_rx) = mpsc::channel();
        let join = std::thread::Builder::new()
            .name(format!("detector-{}", name))
            .spawn(move || {
                match panic::catch_unwind(AssertUnwindSafe(|| detector.warm_up())) {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => log::warn!("detector {} warm-up failed: {:#}", name, err),
                    Err(payload) => log::warn!(
                        "detector {} warm-up panicked: {}",
                        name,
                        panic_message(payload.as_ref())
                    ),
                }
                for DetectionJob { frame, reply } in jobs_rx {
                    let outcome =
                        panic::catch_unwind(AssertUnwindSafe(|| detector.detect(&frame)))
                            .unwrap_or_else(|payload| {
                                Err(anyhow!(
                                    "detector {} panicked: {}",
                                    name,
                                    panic_message(payload.as_ref())
                                ))
                            });
                    drop(frame);
                    // The coordinator may have given up on this call.
                    let _ = reply.send(outcome);
                }
                detector.close();
                let _ = done_tx.send(());
            })
            .context("spawn detector worker")?;
        Ok(Self {
            name,
            jobs: Some(jobs_tx),
            done: done_rx,
            join: Some(join),
        })
    }

    fn submit(&self, frame: CameraFrame, timeout: Duration) -> Result<PendingDetection> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| anyhow!("detector worker shut down"))?;
        let sequence = frame.sequence;
        let (reply_tx, reply_rx) = mpsc::channel();
        jobs.try_send(DetectionJob {
            frame,
            reply: reply_tx,
        })
        .map_err(|_| anyhow!("detector worker {} not accepting frames", self.name))?;
        Ok(PendingDetection {
            reply: reply_rx,
            sequence,
            deadline: Instant::now() + timeout,
            timed_out: false,
        })
    }

    fn shutdown(mut self, timeout: Duration) {
        self.jobs = None;
        match self.done.recv_timeout(timeout) {
            Ok(()) => {
                if let Some(join) = self.join.take() {
                    if join.join().is_err() {
                        log::warn!("detector worker {} panicked during shutdown", self.name);
                    }
                }
                log::debug!("detector {} released", self.name);
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "detector {} did not release within {:?}; detaching worker",
                    self.name,
                    timeout
                );
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("detector worker {} exited without closing", self.name);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Coordinator
// ----------------------------------------------------------------------------

/// Runs one monitoring session.
pub struct PipelineCoordinator {
    config: PipelineConfig,
    state: PipelineState,
    source: Option<Box<dyn FrameSource>>,
    detector: Option<Box<dyn FaceDetector>>,
    worker: Option<DetectorWorker>,
    scheduler: SamplingScheduler,
    classifier: GazeClassifier,
    publisher: StatusPublisher,
    pending: Option<PendingDetection>,
    stats: PipelineStats,
    consecutive_read_failures: u32,
}

impl PipelineCoordinator {
    /// Build a session. `source` is `None` when no camera handle could be
    /// obtained; starting such a session reports the camera as not found.
    pub fn new(
        config: PipelineConfig,
        source: Option<Box<dyn FrameSource>>,
        detector: Box<dyn FaceDetector>,
    ) -> Result<Self> {
        let scheduler = SamplingScheduler::new(config.sampling_interval)?;
        let classifier = GazeClassifier::new(config.gaze_threshold);
        Ok(Self {
            config,
            state: PipelineState::Uninitialized,
            source,
            detector: Some(detector),
            worker: None,
            scheduler,
            classifier,
            publisher: StatusPublisher::new(),
            pending: None,
            stats: PipelineStats::default(),
            consecutive_read_failures: 0,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read side of this session's status channel.
    pub fn status(&self) -> StatusHandle {
        self.publisher.handle()
    }

    /// Register a callback for every status this session publishes.
    pub fn on_status<F>(&self, observer: F)
    where
        F: FnMut(MonitoringStatus) + Send + 'static,
    {
        self.publisher.on_update(observer);
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            frames_seen: self.scheduler.frames_seen(),
            ..self.stats
        }
    }

    /// True while a detector call is outstanding.
    pub fn detection_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Start the camera and the detector worker.
    pub fn start(&mut self) -> Result<PipelineState> {
        if self.state != PipelineState::Uninitialized {
            bail!("monitoring session cannot start from {:?}", self.state);
        }
        self.state = PipelineState::Starting;

        let Some(source) = self.source.as_mut() else {
            log::warn!("monitoring session has no camera source");
            return Ok(self.fail(MonitoringStatus::CameraNotFound));
        };
        log::info!("starting camera {}", source.describe());
        if let Err(err) = source.start() {
            log::warn!("camera start failed: {}", err);
            return Ok(self.fail(MonitoringStatus::from(&err)));
        }

        let detector = self
            .detector
            .take()
            .ok_or_else(|| anyhow!("detector already consumed"))?;
        match DetectorWorker::spawn(detector) {
            Ok(worker) => self.worker = Some(worker),
            Err(err) => {
                self.release();
                self.publisher.close();
                self.state = PipelineState::Failed;
                return Err(err);
            }
        }

        self.state = PipelineState::Running;
        log::info!(
            "monitoring session running (sampling every {} frames, gaze threshold {:.2}, detector timeout {:?})",
            self.config.sampling_interval,
            self.config.gaze_threshold,
            self.config.detector_timeout
        );
        Ok(self.state)
    }

    /// Feed one camera frame into the session.
    pub fn on_frame(&mut self, frame: CameraFrame) -> FrameDisposition {
        if self.state != PipelineState::Running {
            return FrameDisposition::Ignored;
        }
        self.poll();

        if !self.scheduler.on_frame() {
            return FrameDisposition::Skipped;
        }
        self.stats.sampled += 1;

        if let Some(pending) = &self.pending {
            self.stats.dropped_busy += 1;
            log::debug!(
                "frame {} dropped: detector busy with frame {}",
                frame.sequence,
                pending.sequence
            );
            return FrameDisposition::DroppedBusy;
        }

        let Some(worker) = self.worker.as_ref() else {
            return FrameDisposition::DetectorUnavailable;
        };
        match worker.submit(frame, self.config.detector_timeout) {
            Ok(pending) => {
                self.stats.submitted += 1;
                self.pending = Some(pending);
                FrameDisposition::Submitted
            }
            Err(err) => {
                self.stats.detector_errors += 1;
                log::warn!("{:#}", err);
                FrameDisposition::DetectorUnavailable
            }
        }
    }

    /// Collect a finished detector call without blocking. Returns the status
    /// published for it, if any.
    pub fn poll(&mut self) -> Option<MonitoringStatus> {
        let pending = self.pending.as_mut()?;
        match pending.reply.try_recv() {
            Ok(outcome) => self.complete(outcome),
            Err(TryRecvError::Empty) => {
                self.check_deadline();
                None
            }
            Err(TryRecvError::Disconnected) => self.detector_lost(),
        }
    }

    /// Block up to `timeout` for the outstanding detector call.
    pub fn wait_for_detection(&mut self, timeout: Duration) -> Option<MonitoringStatus> {
        let give_up = Instant::now() + timeout;
        loop {
            let pending = self.pending.as_ref()?;
            let now = Instant::now();
            if now >= give_up {
                return None;
            }
            let mut wait = give_up - now;
            if !pending.timed_out {
                wait = wait.min(pending.deadline.saturating_duration_since(now));
            }
            match pending.reply.recv_timeout(wait) {
                Ok(outcome) => return self.complete(outcome),
                Err(RecvTimeoutError::Timeout) => self.check_deadline(),
                Err(RecvTimeoutError::Disconnected) => return self.detector_lost(),
            }
        }
    }

    /// Pull frames from the source until `shutdown` is set or the stream
    /// ends, then stop the session.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<PipelineState> {
        if self.state != PipelineState::Running {
            return Ok(self.state);
        }
        let mut last_health_log = Instant::now();

        while self.state == PipelineState::Running && !shutdown.load(Ordering::SeqCst) {
            let next = match self.source.as_mut() {
                Some(source) => source.next_frame(),
                None => break,
            };
            match next {
                Ok(frame) => {
                    self.consecutive_read_failures = 0;
                    self.on_frame(frame);
                }
                Err(CameraError::EndOfStream) => {
                    log::info!("camera stream ended");
                    self.wait_for_detection(self.config.detector_timeout);
                    break;
                }
                Err(err) => {
                    self.stats.read_failures += 1;
                    self.consecutive_read_failures += 1;
                    log::warn!(
                        "frame read failed ({}/{}): {}",
                        self.consecutive_read_failures,
                        self.config.max_read_failures,
                        err
                    );
                    if self.consecutive_read_failures >= self.config.max_read_failures {
                        self.publisher.publish(MonitoringStatus::from(&err));
                        break;
                    }
                }
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = self.stats();
                log::info!(
                    "session health frames={} sampled={} processed={} dropped_busy={} timeouts={} detector_errors={} status={}",
                    stats.frames_seen,
                    stats.sampled,
                    stats.results_processed,
                    stats.dropped_busy,
                    stats.timeouts,
                    stats.detector_errors,
                    self.publisher.handle().render()
                );
                last_health_log = Instant::now();
            }
        }

        self.stop();
        Ok(self.state)
    }

    /// End the session and release the camera and detector.
    ///
    /// Publishes nothing. Returns false when there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        if !matches!(
            self.state,
            PipelineState::Running | PipelineState::Starting
        ) {
            return false;
        }
        self.publisher.close();
        if let Some(pending) = self.pending.take() {
            log::debug!("abandoning detector call for frame {}", pending.sequence);
        }
        self.release();
        self.state = PipelineState::Stopped;
        let stats = self.stats();
        log::info!(
            "monitoring session stopped after {} frames ({} detector results)",
            stats.frames_seen,
            stats.results_processed
        );
        true
    }

    fn fail(&mut self, status: MonitoringStatus) -> PipelineState {
        self.publisher.publish(status);
        self.publisher.close();
        self.release();
        self.state = PipelineState::Failed;
        self.state
    }

    fn release(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown(self.config.release_timeout);
        }
        if let Some(mut detector) = self.detector.take() {
            detector.close();
        }
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
    }

    fn complete(&mut self, outcome: DetectionReply) -> Option<MonitoringStatus> {
        let pending = self.pending.take()?;
        if pending.timed_out {
            log::debug!(
                "late detector result for frame {} discarded",
                pending.sequence
            );
            return None;
        }
        match outcome {
            Ok(result) => {
                self.stats.results_processed += 1;
                let status = status::evaluate(&result, &self.classifier);
                log::debug!(
                    "frame {}: {} face(s) -> {}",
                    pending.sequence,
                    result.face_count(),
                    status
                );
                self.publisher.publish(status);
                Some(status)
            }
            Err(err) => {
                self.stats.detector_errors += 1;
                log::warn!(
                    "detector failed on frame {}: {:#}; keeping previous status",
                    pending.sequence,
                    err
                );
                None
            }
        }
    }

    fn check_deadline(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if !pending.timed_out && Instant::now() >= pending.deadline {
            pending.timed_out = true;
            self.stats.timeouts += 1;
            log::warn!(
                "detector call for frame {} exceeded {:?}; frame dropped",
                pending.sequence,
                self.config.detector_timeout
            );
        }
    }

    fn detector_lost(&mut self) -> Option<MonitoringStatus> {
        if let Some(pending) = self.pending.take() {
            self.stats.detector_errors += 1;
            log::error!(
                "detector worker exited while processing frame {}",
                pending.sequence
            );
        }
        if let Some(worker) = self.worker.take() {
            worker.shutdown(self.config.release_timeout);
        }
        None
    }
}

impl Drop for PipelineCoordinator {
    fn drop(&mut self) {
        if !self.stop() && self.state == PipelineState::Uninitialized {
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ScriptStep, ScriptedDetector};
    use crate::ingest::{CameraConfig, SyntheticSource};

    fn synthetic(device: &str) -> Box<dyn FrameSource> {
        Box::new(
            SyntheticSource::new(CameraConfig {
                device: device.to_string(),
                width: 4,
                height: 4,
                fps: 30,
            })
            .unpaced(),
        )
    }

    fn frame(sequence: u64) -> CameraFrame {
        CameraFrame::rgb(vec![0u8; 12], 2, 2, sequence)
    }

    fn config(interval: u32) -> PipelineConfig {
        PipelineConfig {
            sampling_interval: interval,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn zero_interval_is_rejected_at_construction() {
        let detector = Box::new(ScriptedDetector::new([]));
        assert!(PipelineCoordinator::new(config(0), None, detector).is_err());
    }

    #[test]
    fn start_twice_is_an_error() -> Result<()> {
        let detector = Box::new(ScriptedDetector::constant(ScriptedDetector::single_face(0.5, 0.5)));
        let mut pipeline =
            PipelineCoordinator::new(config(1), Some(synthetic("stub://webcam")), detector)?;
        assert_eq!(pipeline.start()?, PipelineState::Running);
        assert!(pipeline.start().is_err());
        Ok(())
    }

    #[test]
    fn frames_before_start_are_ignored() -> Result<()> {
        let detector = Box::new(ScriptedDetector::new([]));
        let mut pipeline =
            PipelineCoordinator::new(config(1), Some(synthetic("stub://webcam")), detector)?;
        assert_eq!(pipeline.on_frame(frame(1)), FrameDisposition::Ignored);
        Ok(())
    }

    #[test]
    fn sampled_frame_publishes_status() -> Result<()> {
        let detector = Box::new(ScriptedDetector::constant(ScriptedDetector::single_face(0.3, 0.6)));
        let mut pipeline =
            PipelineCoordinator::new(config(3), Some(synthetic("stub://webcam")), detector)?;
        pipeline.start()?;

        assert_eq!(pipeline.on_frame(frame(1)), FrameDisposition::Skipped);
        assert_eq!(pipeline.on_frame(frame(2)), FrameDisposition::Skipped);
        assert_eq!(pipeline.on_frame(frame(3)), FrameDisposition::Submitted);

        let status = pipeline.wait_for_detection(Duration::from_secs(5));
        assert_eq!(status, Some(MonitoringStatus::LookingLeft));
        assert_eq!(pipeline.status().current(), Some(MonitoringStatus::LookingLeft));
        Ok(())
    }

    #[test]
    fn busy_detector_drops_sampled_frames() -> Result<()> {
        let detector = Box::new(ScriptedDetector::new([ScriptStep::Stall(
            Duration::from_millis(300),
            ScriptedDetector::single_face(0.5, 0.5),
        )]));
        let mut pipeline =
            PipelineCoordinator::new(config(1), Some(synthetic("stub://webcam")), detector)?;
        pipeline.start()?;

        assert_eq!(pipeline.on_frame(frame(1)), FrameDisposition::Submitted);
        assert_eq!(pipeline.on_frame(frame(2)), FrameDisposition::DroppedBusy);
        assert_eq!(pipeline.on_frame(frame(3)), FrameDisposition::DroppedBusy);
        assert!(pipeline.detection_in_flight());

        assert_eq!(
            pipeline.wait_for_detection(Duration::from_secs(5)),
            Some(MonitoringStatus::FaceDetected)
        );
        let stats = pipeline.stats();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.dropped_busy, 2);
        assert_eq!(stats.frames_seen, 3);
        Ok(())
    }

    #[test]
    fn detector_error_keeps_previous_status() -> Result<()> {
        let detector = Box::new(ScriptedDetector::new([
            ScriptStep::Detect(DetectionResult::empty()),
            ScriptStep::Fail("inference backend crashed".into()),
            ScriptStep::Detect(ScriptedDetector::single_face(0.5, 0.5)),
        ]));
        let mut pipeline =
            PipelineCoordinator::new(config(1), Some(synthetic("stub://webcam")), detector)?;
        pipeline.start()?;
        let handle = pipeline.status();

        pipeline.on_frame(frame(1));
        pipeline.wait_for_detection(Duration::from_secs(5));
        assert_eq!(handle.current(), Some(MonitoringStatus::FaceNotDetected));

        pipeline.on_frame(frame(2));
        assert_eq!(pipeline.wait_for_detection(Duration::from_secs(5)), None);
        assert_eq!(handle.current(), Some(MonitoringStatus::FaceNotDetected));
        assert_eq!(pipeline.stats().detector_errors, 1);

        pipeline.on_frame(frame(3));
        assert_eq!(
            pipeline.wait_for_detection(Duration::from_secs(5)),
            Some(MonitoringStatus::FaceDetected)
        );
        Ok(())
    }

    #[test]
    fn panicking_detector_call_is_retried_on_next_sample() -> Result<()> {
        let detector = ScriptedDetector::new([
            ScriptStep::Panic("native backend fault".into()),
            ScriptStep::Detect(ScriptedDetector::single_face(0.5, 0.5)),
        ]);
        let probe = detector.probe();
        let mut pipeline =
            PipelineCoordinator::new(config(1), Some(synthetic("stub://webcam")), Box::new(detector))?;
        pipeline.start()?;
        let handle = pipeline.status();

        assert_eq!(pipeline.on_frame(frame(1)), FrameDisposition::Submitted);
        assert_eq!(pipeline.wait_for_detection(Duration::from_secs(5)), None);
        assert_eq!(handle.current(), None);
        assert_eq!(pipeline.stats().detector_errors, 1);

        assert_eq!(pipeline.on_frame(frame(2)), FrameDisposition::Submitted);
        assert_eq!(
            pipeline.wait_for_detection(Duration::from_secs(5)),
            Some(MonitoringStatus::FaceDetected)
        );
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert_eq!(probe.calls(), 2);

        assert!(pipeline.stop());
        assert_eq!(probe.closes(), 1);
        Ok(())
    }

    #[test]
    fn slow_detector_result_is_dropped_after_timeout() -> Result<()> {
        let detector = Box::new(ScriptedDetector::new([
            ScriptStep::Stall(Duration::from_millis(400), DetectionResult::empty()),
            ScriptStep::Detect(ScriptedDetector::single_face(0.5, 0.5)),
        ]));
        let cfg = PipelineConfig {
            sampling_interval: 1,
            detector_timeout: Duration::from_millis(50),
            ..PipelineConfig::default()
        };
        let mut pipeline = PipelineCoordinator::new(cfg, Some(synthetic("stub://webcam")), detector)?;
        pipeline.start()?;
        let handle = pipeline.status();

        assert_eq!(pipeline.on_frame(frame(1)), FrameDisposition::Submitted);
        assert_eq!(pipeline.wait_for_detection(Duration::from_secs(5)), None);
        assert_eq!(pipeline.stats().timeouts, 1);
        assert_eq!(handle.current(), None);
        assert!(!pipeline.detection_in_flight());

        assert_eq!(pipeline.on_frame(frame(2)), FrameDisposition::Submitted);
        assert_eq!(
            pipeline.wait_for_detection(Duration::from_secs(5)),
            Some(MonitoringStatus::FaceDetected)
        );
        Ok(())
    }
}
