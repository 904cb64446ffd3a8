//! Driver loop
//!
//! Owns the engine, feeds it one frame per tick, executes the commands it
//! returns and publishes the display snapshot. Control messages and speech
//! capture results are interleaved with ticks but never block them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use alerting::{AlertOutputs, Command, NotificationRequest};
use event_fusion::{EngineSnapshot, SafetyEngine, SensorInputs};
use notifier::{EmergencyMessage, EmergencyNotifier};
use sensors::{tilt_angle_degrees, GpsFix, GpsTracker};
use sobriety::{run_capture, CaptureOutcome, SpeechCapture, Verdict};

use crate::hardware::SensorFeeds;
use crate::replay::{FrameSource, ReplayFrame};

/// Requests from the HTTP surface or the console
#[derive(Debug)]
pub enum ControlMessage {
    /// Clear the accident latch and a failed sobriety test
    Reset,
    /// Start listening for the pending sobriety phrase; replies with the
    /// challenge id, or `None` when nothing is pending or already listening
    StartCapture { reply: oneshot::Sender<Option<u64>> },
    /// One-off alcohol check
    ProbeGas { reply: oneshot::Sender<GasProbe> },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GasProbe {
    pub reading: Option<f64>,
    pub alcohol_detected: bool,
}

/// Everything the loop talks to
pub struct DriverPorts {
    pub frames: Box<dyn FrameSource>,
    pub feeds: SensorFeeds,
    pub outputs: Box<dyn AlertOutputs>,
    pub notifier: Arc<dyn EmergencyNotifier>,
    pub speech: Arc<dyn SpeechCapture>,
}

/// Client side of a running driver
#[derive(Clone)]
pub struct DriverHandle {
    pub control: mpsc::Sender<ControlMessage>,
    pub snapshot: watch::Receiver<EngineSnapshot>,
}

type CaptureResult = (u64, CaptureOutcome);

pub struct Driver {
    engine: SafetyEngine,
    ports: DriverPorts,
    gps: GpsTracker,
    /// Last value seen on the serial GPS feed
    serial_fix: GpsFix,
    /// Newest fix from either source
    gps_fix: GpsFix,
    last_gas: Option<f64>,
    vehicle_id: String,
    frame_interval: Duration,
    control_rx: mpsc::Receiver<ControlMessage>,
    capture_tx: mpsc::Sender<CaptureResult>,
    capture_rx: mpsc::Receiver<CaptureResult>,
    snapshot_tx: watch::Sender<EngineSnapshot>,
}

impl Driver {
    pub fn new(
        engine: SafetyEngine,
        ports: DriverPorts,
        vehicle_id: impl Into<String>,
        frame_interval: Duration,
    ) -> (Self, DriverHandle) {
        let (control_tx, control_rx) = mpsc::channel(32);
        let (capture_tx, capture_rx) = mpsc::channel(4);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

        let driver = Self {
            engine,
            ports,
            gps: GpsTracker::new(),
            serial_fix: GpsFix::default(),
            gps_fix: GpsFix::default(),
            last_gas: None,
            vehicle_id: vehicle_id.into(),
            frame_interval,
            control_rx,
            capture_tx,
            capture_rx,
            snapshot_tx,
        };
        let handle = DriverHandle {
            control: control_tx,
            snapshot: snapshot_rx,
        };
        (driver, handle)
    }

    /// Run until the frame source ends or a shutdown is requested
    pub async fn run(mut self) {
        info!("Driver loop started ({:?} per frame)", self.frame_interval);
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.ports.frames.next_frame() {
                        Some(frame) => self.on_frame(frame),
                        None => {
                            info!("Frame source exhausted");
                            break;
                        }
                    }
                }
                Some(message) = self.control_rx.recv() => {
                    if !self.on_control(message) {
                        break;
                    }
                }
                Some((challenge_id, outcome)) = self.capture_rx.recv() => {
                    self.on_capture(challenge_id, outcome);
                }
            }
        }

        let commands = self.engine.shutdown();
        self.execute(commands);
        self.publish(self.engine.snapshot());
        info!("Driver loop stopped");
    }

    fn on_frame(&mut self, frame: ReplayFrame) {
        let gps = self.resolve_gps(frame.nmea.as_deref());

        let tilt_degrees = frame
            .tilt_degrees
            .or_else(|| frame.accel.as_ref().and_then(tilt_angle_degrees))
            .or_else(|| self.ports.feeds.tilt());
        let gas = frame.gas.or_else(|| self.ports.feeds.gas());
        self.last_gas = gas;

        let inputs = SensorInputs {
            face: frame.face,
            gas,
            tilt_degrees,
            gps,
        };
        let output = self.engine.tick(now(), &inputs);
        counter!("safety_ticks_total").increment(1);

        self.execute(output.commands);
        self.publish(output.snapshot);
    }

    /// Replay sentences and the serial feed both supply fixes; whichever
    /// changed most recently wins
    fn resolve_gps(&mut self, sentence: Option<&str>) -> GpsFix {
        if let Some(sentence) = sentence {
            if self.gps.ingest(sentence) {
                self.gps_fix = self.gps.last_fix();
            }
        }

        let serial = self.ports.feeds.gps();
        if serial.coordinates().is_some() && serial != self.serial_fix {
            debug!("Serial GPS fix updated: {}", serial.display_text());
            self.serial_fix = serial;
            self.gps_fix = serial;
        }
        self.gps_fix
    }

    fn on_control(&mut self, message: ControlMessage) -> bool {
        match message {
            ControlMessage::Reset => {
                let commands = self.engine.reset();
                self.execute(commands);
            }
            ControlMessage::StartCapture { reply } => {
                let challenge_id = self.start_capture();
                if reply.send(challenge_id).is_err() {
                    debug!("Capture requester went away");
                }
            }
            ControlMessage::ProbeGas { reply } => {
                let reading = self.ports.feeds.gas().or(self.last_gas);
                let probe = GasProbe {
                    reading,
                    alcohol_detected: self.engine.probe_gas(reading),
                };
                if reply.send(probe).is_err() {
                    debug!("Probe requester went away");
                }
            }
            ControlMessage::Shutdown => {
                info!("Shutdown requested");
                return false;
            }
        }
        self.publish(self.engine.snapshot());
        true
    }

    fn start_capture(&mut self) -> Option<u64> {
        let request = self.engine.begin_sobriety_capture()?;
        let challenge_id = request.challenge_id;
        info!("Say: {}", request.prompt);

        let speech = self.ports.speech.clone();
        let results = self.capture_tx.clone();
        tokio::spawn(async move {
            let outcome = run_capture(speech, &request).await;
            if results.send((request.challenge_id, outcome)).await.is_err() {
                debug!("Driver stopped before capture {} finished", request.challenge_id);
            }
        });
        Some(challenge_id)
    }

    fn on_capture(&mut self, challenge_id: u64, outcome: CaptureOutcome) {
        let applied = self.engine.complete_sobriety_capture(now(), challenge_id, &outcome);
        let result = match &applied.verdict {
            Some(Verdict::Passed { .. }) => "passed",
            Some(Verdict::Failed(_)) => "failed",
            None => "stale",
        };
        counter!("safety_sobriety_results_total", "result" => result).increment(1);

        self.execute(applied.commands);
        self.publish(self.engine.snapshot());
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::SendNotification(request) => self.notify(&request),
                other => self.ports.outputs.execute(&other),
            }
        }
    }

    /// Dispatch failures are logged and counted; there is no retry
    fn notify(&self, request: &NotificationRequest) {
        let message = EmergencyMessage::new(request, &self.vehicle_id, Utc::now());
        let outcome = match self.ports.notifier.send(&message) {
            Ok(()) => {
                info!("Emergency notification sent: {}", message.incident);
                "sent"
            }
            Err(e) => {
                warn!("Emergency notification for {} failed: {}", request.concern, e);
                "failed"
            }
        };
        counter!(
            "safety_notifications_total",
            "concern" => request.concern.as_str(),
            "outcome" => outcome
        )
        .increment(1);
    }

    fn publish(&self, snapshot: EngineSnapshot) {
        gauge!("safety_buzzer_active").set(if snapshot.buzzer_active { 1.0 } else { 0.0 });
        self.snapshot_tx.send_replace(snapshot);
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use alerting::Concern;
    use dms::FaceObservation;
    use event_fusion::EngineConfig;
    use notifier::NotifyError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::replay::VecFrameSource;
    use crate::speech::FixedTranscriber;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<EmergencyMessage>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn concerns(&self) -> Vec<Concern> {
            self.sent.lock().unwrap().iter().map(|m| m.concern).collect()
        }
    }

    impl EmergencyNotifier for RecordingNotifier {
        fn send(&self, message: &EmergencyMessage) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(NotifyError::Connection("offline".to_string()));
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingOutputs(Arc<Mutex<Vec<&'static str>>>);

    impl AlertOutputs for RecordingOutputs {
        fn play_tone(&mut self) {
            self.0.lock().unwrap().push("tone on");
        }
        fn stop_tone(&mut self) {
            self.0.lock().unwrap().push("tone off");
        }
        fn activate_buzzer(&mut self) {
            self.0.lock().unwrap().push("buzzer on");
        }
        fn deactivate_buzzer(&mut self) {
            self.0.lock().unwrap().push("buzzer off");
        }
    }

    /// Endless frames with an open-eyed driver and the given gas reading
    struct SteadyFrames(Option<f64>);

    impl FrameSource for SteadyFrames {
        fn next_frame(&mut self) -> Option<ReplayFrame> {
            Some(ReplayFrame {
                face: FaceObservation::face(0.3, 0.2),
                gas: self.0,
                ..Default::default()
            })
        }
    }

    fn build_driver(
        frames: Box<dyn FrameSource>,
        notifier: Arc<RecordingNotifier>,
        outputs: RecordingOutputs,
        speech: &str,
    ) -> (Driver, DriverHandle) {
        build_driver_with_feeds(frames, SensorFeeds::default(), notifier, outputs, speech)
    }

    fn build_driver_with_feeds(
        frames: Box<dyn FrameSource>,
        feeds: SensorFeeds,
        notifier: Arc<RecordingNotifier>,
        outputs: RecordingOutputs,
        speech: &str,
    ) -> (Driver, DriverHandle) {
        let engine = SafetyEngine::with_rng(EngineConfig::default(), StdRng::seed_from_u64(1));
        let ports = DriverPorts {
            frames,
            feeds,
            outputs: Box::new(outputs),
            notifier,
            speech: Arc::new(FixedTranscriber(speech.to_string())),
        };
        Driver::new(engine, ports, "test-vehicle", Duration::from_millis(2))
    }

    fn tilted(tilt: f64) -> ReplayFrame {
        ReplayFrame {
            tilt_degrees: Some(tilt),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_accident_replay_notifies_once_and_silences_on_exit() {
        let notifier = Arc::new(RecordingNotifier::default());
        let outputs = RecordingOutputs::default();
        let frames = VecFrameSource::new(vec![
            ReplayFrame {
                nmea: Some(NEW_YORK.to_string()),
                ..Default::default()
            },
            tilted(10.0),
            tilted(50.0),
            tilted(10.0),
            tilted(60.0),
        ]);
        let (driver, handle) = build_driver(Box::new(frames), notifier.clone(), outputs.clone(), "");

        driver.run().await;

        assert_eq!(notifier.concerns(), vec![Concern::Accident]);
        let message = notifier.sent.lock().unwrap()[0].clone();
        assert_eq!(message.vehicle_id, "test-vehicle");
        assert_eq!(message.lat, Some(40.0));
        assert_eq!(message.lon, Some(-73.0));
        assert_eq!(*outputs.0.lock().unwrap(), vec!["buzzer on", "buzzer off"]);
        assert!(!handle.snapshot.borrow().buzzer_active);
        assert!(handle.snapshot.borrow().accident.detected);
    }

    const NEW_YORK: &str = "$GPGGA,123519,4000.000,N,07300.000,W,1,08,0.9,545.4,M,46.9,M,,*47";
    const MUNICH: &str = "$GPGGA,123520,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

    fn serial_feed(fix: GpsFix) -> SensorFeeds {
        SensorFeeds {
            gps: Some(sensors::SamplerService::spawn(
                "gps",
                Duration::from_millis(1),
                fix,
                move || fix,
            )),
            ..Default::default()
        }
    }

    fn nmea(sentence: &str) -> ReplayFrame {
        ReplayFrame {
            nmea: Some(sentence.to_string()),
            ..Default::default()
        }
    }

    async fn accident_fix(frames: Vec<ReplayFrame>, feeds: SensorFeeds) -> (Option<f64>, Option<f64>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let (driver, _handle) = build_driver_with_feeds(
            Box::new(VecFrameSource::new(frames)),
            feeds,
            notifier.clone(),
            RecordingOutputs::default(),
            "",
        );
        driver.run().await;

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        (sent[0].lat, sent[0].lon)
    }

    #[tokio::test]
    async fn test_serial_fix_still_used_after_replay_fix() {
        let (lat, lon) = accident_fix(
            vec![nmea(NEW_YORK), ReplayFrame::default(), tilted(80.0)],
            serial_feed(GpsFix::new(10.0, 20.0)),
        )
        .await;
        assert_eq!((lat, lon), (Some(10.0), Some(20.0)));
    }

    #[tokio::test]
    async fn test_newer_replay_fix_beats_unchanged_serial_fix() {
        let (lat, lon) = accident_fix(
            vec![ReplayFrame::default(), nmea(MUNICH), tilted(80.0)],
            serial_feed(GpsFix::new(10.0, 20.0)),
        )
        .await;
        assert!((lat.unwrap() - 48.1173).abs() < 1e-4);
        assert!((lon.unwrap() - 11.516_666).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_accelerometer_frames_feed_tilt() {
        let notifier = Arc::new(RecordingNotifier::default());
        let frames = VecFrameSource::new(vec![ReplayFrame {
            accel: Some(sensors::AccelSample::new(1.0, 0.0, 0.0)),
            ..Default::default()
        }]);
        let (driver, handle) = build_driver(Box::new(frames), notifier.clone(), RecordingOutputs::default(), "");

        driver.run().await;

        assert_eq!(notifier.concerns(), vec![Concern::Accident]);
        let angle = handle.snapshot.borrow().accident.tilt_angle_at_detection.unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_notification_is_not_retried() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let frames = VecFrameSource::new((0..20).map(|_| tilted(80.0)).collect());
        let (driver, _handle) = build_driver(Box::new(frames), notifier.clone(), RecordingOutputs::default(), "");

        driver.run().await;

        assert_eq!(notifier.concerns(), vec![Concern::Accident]);
    }

    #[tokio::test]
    async fn test_failed_sobriety_capture_notifies_without_blocking_ticks() {
        let notifier = Arc::new(RecordingNotifier::default());
        let outputs = RecordingOutputs::default();
        let (driver, mut handle) = build_driver(
            Box::new(SteadyFrames(Some(700.0))),
            notifier.clone(),
            outputs.clone(),
            "purple zebra",
        );
        let task = tokio::spawn(driver.run());

        handle
            .snapshot
            .wait_for(|s| s.challenge.active)
            .await
            .unwrap();
        let (reply, response) = oneshot::channel();
        handle
            .control
            .send(ControlMessage::StartCapture { reply })
            .await
            .unwrap();
        assert!(response.await.unwrap().is_some());

        handle
            .snapshot
            .wait_for(|s| s.buzzer_active)
            .await
            .unwrap();

        let (reply, response) = oneshot::channel();
        handle
            .control
            .send(ControlMessage::ProbeGas { reply })
            .await
            .unwrap();
        let probe = response.await.unwrap();
        assert_eq!(probe.reading, Some(700.0));
        assert!(probe.alcohol_detected);

        handle.control.send(ControlMessage::Reset).await.unwrap();
        handle.control.send(ControlMessage::Shutdown).await.unwrap();
        task.await.unwrap();

        assert_eq!(notifier.concerns(), vec![Concern::Intoxication]);
        let outputs = outputs.0.lock().unwrap();
        assert_eq!(outputs.first(), Some(&"buzzer on"));
        assert_eq!(outputs.last(), Some(&"buzzer off"));
    }

    #[tokio::test]
    async fn test_capture_without_challenge_is_refused() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (driver, handle) = build_driver(
            Box::new(SteadyFrames(None)),
            notifier,
            RecordingOutputs::default(),
            "",
        );
        let task = tokio::spawn(driver.run());

        let (reply, response) = oneshot::channel();
        handle
            .control
            .send(ControlMessage::StartCapture { reply })
            .await
            .unwrap();
        assert_eq!(response.await.unwrap(), None);

        handle.control.send(ControlMessage::Shutdown).await.unwrap();
        task.await.unwrap();
    }
}
