//! Engine Runtime

use crate::settings::{ChannelsConfig, EngineConfig, EngineError};
use alerting::{AlertManager, Clock, MonotonicClock, Notification};
use channels::{Channel, ChannelDispatcher, EmailChannel, LocalChannel, SmsChannel};
use classifier::Classifier;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::{AlertRecord, ReadingRecord, Repository};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use trend_window::TrendWindow;
use vitals::{ReadingSource, SensorInput, VitalKind};

/// Build the channel set from configuration
fn build_channels(config: &ChannelsConfig) -> Vec<Channel> {
    vec![
        Channel::Email(EmailChannel::new(config.email.clone())),
        Channel::Sms(SmsChannel::new(config.sms.clone())),
        Channel::Local(LocalChannel::new(config.local.clone())),
    ]
}

/// Top-level reactor: routes readings to per-vital workers, hands
/// approved notifications to the dispatch task, and forwards history to
/// storage. Owns all per-vital state for the life of the process.
pub struct Engine {
    config: EngineConfig,
    classifier: Arc<Classifier>,
    dispatcher: Arc<ChannelDispatcher>,
    repository: Arc<Repository>,
    clock: Arc<dyn Clock>,
    source: Box<dyn ReadingSource>,
}

impl Engine {
    /// Create an engine with production channels and clock
    pub fn new(config: EngineConfig, source: Box<dyn ReadingSource>) -> Result<Self, EngineError> {
        let channels = build_channels(&config.channels);
        Self::with_parts(config, source, Arc::new(MonotonicClock), channels)
    }

    /// Create an engine with explicit clock and channels (used by tests)
    pub fn with_parts(
        config: EngineConfig,
        source: Box<dyn ReadingSource>,
        clock: Arc<dyn Clock>,
        channels: Vec<Channel>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let classifier = Arc::new(Classifier::new(config.thresholds.clone(), config.trend)?);
        let dispatcher = Arc::new(ChannelDispatcher::new(channels, config.dispatch.clone()));
        let repository = Arc::new(Repository::new(config.retention));

        info!(
            interval_ms = config.sample_interval_ms,
            "Engine initialized"
        );

        Ok(Self {
            config,
            classifier,
            dispatcher,
            repository,
            clock,
            source,
        })
    }

    /// History repository handle
    pub fn repository(&self) -> Arc<Repository> {
        self.repository.clone()
    }

    /// Run the acquisition loop until the shutdown flag is raised, then
    /// drain the per-vital and dispatch queues before returning
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), EngineError> {
        // Dispatch task: the only place a slow channel can block, kept off
        // the intake path by a bounded queue
        let (notify_tx, mut notify_rx) = mpsc::channel::<Notification>(self.config.queue_depth);
        let dispatcher = self.dispatcher.clone();
        let dispatch_repo = self.repository.clone();
        let dispatch_task = tokio::spawn(async move {
            while let Some(notification) = notify_rx.recv().await {
                let report = dispatcher.dispatch(&notification).await;
                let record = AlertRecord {
                    id: notification.id,
                    timestamp: notification.created_at,
                    vital: notification.vital.as_str().to_string(),
                    level: notification.level.as_str().to_string(),
                    message: notification.message,
                    value: notification.value,
                    delivery: report.delivery().as_str().to_string(),
                };
                if let Err(e) = dispatch_repo.insert_alert(record) {
                    warn!(error = %e, "failed to record alert history");
                }
            }
            debug!("dispatch task drained");
        });

        // One worker per vital: windows and incident state are owned by
        // exactly one task, so same-vital readings stay serialized while
        // vitals proceed independently
        let mut input_txs: HashMap<VitalKind, mpsc::Sender<SensorInput>> = HashMap::new();
        let mut workers = Vec::new();
        for vital in VitalKind::ALL {
            let (tx, rx) = mpsc::channel::<SensorInput>(self.config.queue_depth);
            input_txs.insert(vital, tx);

            let worker = VitalWorker {
                vital,
                window: self.classifier.make_window(),
                classifier: self.classifier.clone(),
                manager: AlertManager::new(
                    self.config.alerts.to_manager_config(),
                    self.clock.clone(),
                )?,
                repository: self.repository.clone(),
                notify_tx: notify_tx.clone(),
            };
            workers.push(tokio::spawn(worker.run(rx)));
        }
        drop(notify_tx);

        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.sample_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Starting vital signs monitoring");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let timestamp_ms = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_millis() as u64)
                        .unwrap_or(0);

                    for input in self.source.poll(timestamp_ms) {
                        let vital = input.vital();
                        if let Some(tx) = input_txs.get(&vital) {
                            if tx.send(input).await.is_err() {
                                warn!(%vital, "worker stopped, input dropped");
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Stopping monitoring engine");
        drop(input_txs);
        for worker in workers {
            let _ = worker.await;
        }
        let _ = dispatch_task.await;
        info!("Engine stopped");
        Ok(())
    }
}

/// Per-vital processing path: classification and alert decisions for one
/// vital, strictly in arrival order
struct VitalWorker {
    vital: VitalKind,
    window: TrendWindow,
    classifier: Arc<Classifier>,
    manager: AlertManager,
    repository: Arc<Repository>,
    notify_tx: mpsc::Sender<Notification>,
}

impl VitalWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<SensorInput>) {
        debug!(vital = %self.vital, "vital worker started");
        while let Some(input) = rx.recv().await {
            let notification = match input {
                SensorInput::Sample(reading) => {
                    // History append is fire-and-forget; a storage error
                    // never stops the cycle
                    if let Err(e) = self.repository.insert_reading(ReadingRecord::from(&reading)) {
                        warn!(vital = %self.vital, error = %e, "failed to record reading");
                    }

                    let classification = self.classifier.classify(&reading, &mut self.window);
                    self.manager.evaluate(&classification)
                }
                SensorInput::Offline { vital, error } => {
                    debug!(%vital, %error, "sensor offline input");
                    self.manager.evaluate_offline(vital, &error)
                }
            };

            if let Some(notification) = notification {
                if self.notify_tx.send(notification).await.is_err() {
                    warn!(vital = %self.vital, "dispatch queue closed, notification dropped");
                }
            }
        }
        debug!(vital = %self.vital, "vital worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channels::{ChannelKind, MockBehavior, MockChannel};
    use std::collections::VecDeque;
    use vitals::Reading;

    /// Source that replays a fixed script, then goes quiet
    struct ScriptedSource {
        frames: VecDeque<Vec<SensorInput>>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Vec<SensorInput>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl ReadingSource for ScriptedSource {
        fn poll(&mut self, _timestamp_ms: u64) -> Vec<SensorInput> {
            self.frames.pop_front().unwrap_or_default()
        }
    }

    fn test_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.sample_interval_ms = 10;
        config.alerts.offline_grace = 2;
        config.dispatch.retry_backoff_ms = 1;
        config.dispatch.attempt_timeout_ms = 50;
        config
    }

    fn spo2(value: f64, ts: u64) -> SensorInput {
        SensorInput::Sample(Reading::new(VitalKind::SpO2, value, ts))
    }

    async fn run_engine(engine: Engine, settle: Duration) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(engine.run(shutdown_rx));
        tokio::time::sleep(settle).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_reading_recorded_and_alerted() {
        let source = ScriptedSource::new(vec![vec![spo2(88.0, 1_000)]]);
        let engine = Engine::with_parts(
            test_config(),
            Box::new(source),
            Arc::new(MonotonicClock),
            vec![Channel::Mock(MockChannel::new(
                ChannelKind::Local,
                MockBehavior::Succeed,
            ))],
        )
        .unwrap();
        let repo = engine.repository();

        run_engine(engine, Duration::from_millis(100)).await;

        assert_eq!(repo.reading_count(), 1);
        let alerts = repo.recent_alerts(Some("critical"), 10).unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("hypoxemia"));
        assert_eq!(alerts[0].delivery, "delivered");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_vital_alerts_recorded_in_classification_order() {
        // One vital, three notifications: a trend-confirmed Warning opens
        // the incident, a Critical escalates it, three Normals resolve it.
        // The records must land in exactly that order.
        let frames = [92.0, 92.0, 92.0, 88.0, 98.0, 98.0, 98.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| vec![spo2(v, i as u64 * 1000)])
            .collect();
        let engine = Engine::with_parts(
            test_config(),
            Box::new(ScriptedSource::new(frames)),
            Arc::new(MonotonicClock),
            vec![Channel::Mock(MockChannel::new(
                ChannelKind::Local,
                MockBehavior::Succeed,
            ))],
        )
        .unwrap();
        let repo = engine.repository();

        run_engine(engine, Duration::from_millis(300)).await;

        // recent_alerts is newest first
        let alerts = repo.recent_alerts(None, 10).unwrap();
        let levels: Vec<&str> = alerts.iter().map(|a| a.level.as_str()).collect();
        assert_eq!(levels, vec!["info", "critical", "warning"]);
        assert!(alerts[0].message.contains("recovered"));
        assert!(alerts[1].message.contains("hypoxemia"));
        assert!(alerts[2].message.contains("Low blood oxygen"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_readings_produce_no_alerts() {
        let frames = (0..5u64)
            .map(|i| vec![spo2(98.0, i * 1000)])
            .collect();
        let engine = Engine::with_parts(
            test_config(),
            Box::new(ScriptedSource::new(frames)),
            Arc::new(MonotonicClock),
            vec![Channel::Mock(MockChannel::new(
                ChannelKind::Local,
                MockBehavior::Succeed,
            ))],
        )
        .unwrap();
        let repo = engine.repository();

        run_engine(engine, Duration::from_millis(200)).await;

        assert_eq!(repo.reading_count(), 5);
        assert_eq!(repo.alert_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_offline_raises_warning() {
        let offline = || {
            vec![SensorInput::Offline {
                vital: VitalKind::HeartRate,
                error: vitals::SensorError::NotConnected,
            }]
        };
        let engine = Engine::with_parts(
            test_config(), // offline_grace = 2
            Box::new(ScriptedSource::new(vec![offline(), offline()])),
            Arc::new(MonotonicClock),
            vec![Channel::Mock(MockChannel::new(
                ChannelKind::Local,
                MockBehavior::Succeed,
            ))],
        )
        .unwrap();
        let repo = engine.repository();

        run_engine(engine, Duration::from_millis(100)).await;

        let alerts = repo.recent_alerts(Some("warning"), 10).unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_failure_recorded_not_fatal() {
        // Both eligible channels fail permanently; the engine still
        // records the alert and keeps processing
        let frames = vec![vec![spo2(88.0, 1_000)], vec![spo2(98.0, 2_000)]];
        let engine = Engine::with_parts(
            test_config(),
            Box::new(ScriptedSource::new(frames)),
            Arc::new(MonotonicClock),
            vec![Channel::Mock(MockChannel::new(
                ChannelKind::Local,
                MockBehavior::PermanentFailure,
            ))],
        )
        .unwrap();
        let repo = engine.repository();

        run_engine(engine, Duration::from_millis(100)).await;

        assert_eq!(repo.reading_count(), 2);
        let alerts = repo.recent_alerts(None, 10).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].delivery, "failed");
    }
}
