use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Local, Timelike, Utc};
use tracing::{debug, info};

use crate::backend::FraudBackend;
use crate::click_history::ClickHistory;
use crate::config::Config;
use crate::features::{build_feature_record, ClickContext, DeviceProfile, FeatureRecord};
use crate::orchestrator::{ClickResolution, Notification, SubmissionOrchestrator};
use crate::scorer::BotScorer;
use crate::signals::{CollectorSet, InteractionEvent, SessionSignals};

/// How the ad is laid out on the host page, which determines the placement
/// tag sent to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdOrientation {
    Horizontal,
    Vertical,
}

impl AdOrientation {
    pub fn placement(self) -> &'static str {
        match self {
            AdOrientation::Horizontal => "middle",
            AdOrientation::Vertical => "sidebar",
        }
    }
}

/// Demo ad creative, keyed by ad id with per-ad defaults.
#[derive(Debug, Clone)]
pub struct AdCreative {
    pub title: String,
    pub description: String,
}

impl AdCreative {
    pub fn for_ad(ad_id: &str) -> Self {
        let (title, description) = match ad_id {
            "ad1" => (
                "Premium Smart Watch",
                "Track your health, fitness, and sleep. Limited time offer: 30% off!",
            ),
            "ad2" => (
                "Secure Cloud Storage",
                "1TB of encrypted cloud storage. Start your 30-day free trial today!",
            ),
            "ad3" => (
                "Professional Fitness Equipment",
                "Transform your home into a gym. Free shipping on orders over $100!",
            ),
            _ => (
                "Smart Device",
                "Latest technology at your fingertips. Limited time offer available now!",
            ),
        };
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Shared mounted flag. In-flight submissions hold a clone and must check
/// it before touching UI state, since the widget may unmount while a
/// network call is pending.
#[derive(Clone)]
pub struct MountGuard {
    mounted: Arc<AtomicBool>,
}

impl MountGuard {
    fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}

/// The user-visible widget state a resolution is allowed to mutate.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub clicked: bool,
    pub flagged: bool,
    pub last_notification: Option<Notification>,
}

/// One ad-click widget session: owns its own click history and behavioral
/// counters (no cross-widget sharing), runs its collectors from mount to
/// unmount, and turns each click into a classifier submission.
pub struct AdWidget {
    pub ad_id: String,
    pub creative: AdCreative,
    orientation: AdOrientation,
    profile: DeviceProfile,
    history: ClickHistory,
    signals: SessionSignals,
    collectors: CollectorSet,
    scorer: BotScorer,
    ui: Arc<Mutex<UiState>>,
    guard: MountGuard,
    press_started_ms: Option<f64>,
}

impl AdWidget {
    pub fn mount(
        config: &Config,
        ad_id: &str,
        orientation: AdOrientation,
        profile: DeviceProfile,
    ) -> Self {
        let mount_ms = epoch_ms();
        info!("widget {} mounted ({})", ad_id, orientation.placement());

        Self {
            ad_id: ad_id.to_string(),
            creative: AdCreative::for_ad(ad_id),
            orientation,
            profile,
            history: ClickHistory::new(config.time_window_ms, config.spam_threshold),
            signals: SessionSignals::default(),
            collectors: CollectorSet::attach(mount_ms),
            scorer: BotScorer::new(config.scorer.clone()),
            ui: Arc::new(Mutex::new(UiState::default())),
            guard: MountGuard::new(),
            press_started_ms: None,
        }
    }

    /// Feed one host-page interaction event to the collectors.
    pub fn handle_event(&mut self, event: InteractionEvent) {
        self.collectors.observe(event, &mut self.signals);
    }

    /// Press-down on the ad surface; starts the hold-duration measurement.
    pub fn press_down(&mut self) {
        self.press_started_ms = Some(epoch_ms() as f64);
    }

    /// Synchronous half of a click: rate detection, feature snapshot, local
    /// score. Returns a submission that can be driven to the backend without
    /// borrowing the widget, so an unmount can happen while it is in flight.
    pub fn prepare_click(&mut self) -> PendingSubmission {
        let now = Utc::now();
        let now_ms = now.timestamp_millis() as u64;

        let spam_flagged = self.history.record_and_check(now_ms);
        let bot_score = self.scorer.score(&self.signals, spam_flagged);

        let ctx = ClickContext {
            timestamp: now,
            local_hour: Local::now().hour(),
            press_ms: self.press_started_ms.take(),
            release_ms: now_ms as f64,
            ad_position: self.orientation.placement().to_string(),
        };

        let record = build_feature_record(
            &self.signals,
            self.history.len(),
            bot_score,
            &self.profile,
            &ctx,
        );

        self.ui.lock().unwrap().clicked = true;
        debug!(
            "widget {} click: spam={} score={:.2} frequency={}",
            self.ad_id, spam_flagged, bot_score, record.click_frequency
        );

        PendingSubmission {
            record,
            spam_flagged,
            guard: self.guard.clone(),
            ui: Arc::clone(&self.ui),
        }
    }

    /// Full click path: synchronous telemetry, then the submission chain.
    pub async fn click(&mut self, backend: &dyn FraudBackend) -> ClickResolution {
        self.prepare_click().submit(backend).await
    }

    /// Detach collectors and bar any in-flight submission from updating
    /// discarded state. Symmetric with mount; must not be skipped.
    pub fn unmount(&mut self) {
        info!("widget {} unmounted", self.ad_id);
        self.collectors.detach();
        self.guard.clear();
    }

    pub fn ui_state(&self) -> UiState {
        self.ui.lock().unwrap().clone()
    }

    pub fn signals(&self) -> &SessionSignals {
        &self.signals
    }

    pub fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }
}

/// One click's worth of submission work, detached from the widget borrow.
/// Owns the feature record; the record is dropped after the attempt chain.
pub struct PendingSubmission {
    pub record: FeatureRecord,
    pub spam_flagged: bool,
    guard: MountGuard,
    ui: Arc<Mutex<UiState>>,
}

impl PendingSubmission {
    /// Run the classifier/log chain and apply the resolution to the widget,
    /// unless the widget unmounted while the calls were pending.
    pub async fn submit(self, backend: &dyn FraudBackend) -> ClickResolution {
        let mut orchestrator = SubmissionOrchestrator::new();
        let resolution = orchestrator
            .submit(backend, self.record, self.spam_flagged)
            .await;

        if !self.guard.is_mounted() {
            debug!("widget unmounted mid-flight, discarding resolution");
            return resolution;
        }

        let mut ui = self.ui.lock().unwrap();
        if resolution.flag_widget {
            ui.flagged = true;
        }
        ui.last_notification = Some(resolution.notification.clone());

        resolution
    }
}

fn epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ClassifierVerdict, LogVerdict, SubmitError};
    use async_trait::async_trait;
    use tokio::sync::oneshot;
    use tokio::sync::Mutex as AsyncMutex;

    struct FixedBackend {
        classifier_fraud: bool,
        log_fraud: bool,
    }

    #[async_trait]
    impl FraudBackend for FixedBackend {
        async fn classify(
            &self,
            _record: &FeatureRecord,
        ) -> Result<ClassifierVerdict, SubmitError> {
            Ok(ClassifierVerdict {
                is_fraud: self.classifier_fraud,
                fraud_probability: if self.classifier_fraud { 0.9 } else { 0.02 },
            })
        }

        async fn append_log(
            &self,
            _record: &FeatureRecord,
            _classifier_is_fraud: bool,
        ) -> Result<LogVerdict, SubmitError> {
            Ok(LogVerdict {
                is_fraud: self.log_fraud,
            })
        }
    }

    /// Backend whose classifier call blocks until released, to hold a
    /// submission in flight while the test unmounts the widget.
    struct GatedBackend {
        gate: AsyncMutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl FraudBackend for GatedBackend {
        async fn classify(
            &self,
            _record: &FeatureRecord,
        ) -> Result<ClassifierVerdict, SubmitError> {
            if let Some(rx) = self.gate.lock().await.take() {
                let _ = rx.await;
            }
            Ok(ClassifierVerdict {
                is_fraud: true,
                fraud_probability: 0.99,
            })
        }

        async fn append_log(
            &self,
            _record: &FeatureRecord,
            _classifier_is_fraud: bool,
        ) -> Result<LogVerdict, SubmitError> {
            Ok(LogVerdict { is_fraud: true })
        }
    }

    fn widget() -> AdWidget {
        AdWidget::mount(
            &Config::default(),
            "ad1",
            AdOrientation::Horizontal,
            DeviceProfile::default(),
        )
    }

    #[tokio::test]
    async fn clean_click_marks_clicked_not_flagged() {
        let mut widget = widget();
        let backend = FixedBackend {
            classifier_fraud: false,
            log_fraud: false,
        };

        widget.click(&backend).await;

        let ui = widget.ui_state();
        assert!(ui.clicked);
        assert!(!ui.flagged);
        assert!(matches!(
            ui.last_notification,
            Some(Notification::Success(_))
        ));
    }

    #[tokio::test]
    async fn fraud_verdict_flags_widget() {
        let mut widget = widget();
        let backend = FixedBackend {
            classifier_fraud: true,
            log_fraud: false,
        };

        widget.click(&backend).await;

        assert!(widget.ui_state().flagged);
    }

    #[tokio::test]
    async fn flagged_state_is_sticky_across_clicks() {
        let mut widget = widget();
        let fraud = FixedBackend {
            classifier_fraud: true,
            log_fraud: false,
        };
        let clean = FixedBackend {
            classifier_fraud: false,
            log_fraud: false,
        };

        widget.click(&fraud).await;
        widget.click(&clean).await;

        // A later clean click does not unflag the widget
        assert!(widget.ui_state().flagged);
    }

    #[tokio::test]
    async fn unmount_mid_flight_discards_resolution() {
        let mut widget = widget();
        let (tx, rx) = oneshot::channel();
        let backend = Arc::new(GatedBackend {
            gate: AsyncMutex::new(Some(rx)),
        });

        let pending = widget.prepare_click();
        let backend_task = Arc::clone(&backend);
        let task = tokio::spawn(async move { pending.submit(backend_task.as_ref()).await });

        // Unmount while the classifier call is parked, then release it
        widget.unmount();
        tx.send(()).unwrap();
        let resolution = task.await.unwrap();

        // The chain resolved fraud, but the widget was gone: nothing applied
        assert!(resolution.flag_widget);
        let ui = widget.ui_state();
        assert!(!ui.flagged);
        assert!(ui.last_notification.is_none());
    }

    #[tokio::test]
    async fn events_after_unmount_do_not_mutate_signals() {
        let mut widget = widget();
        widget.handle_event(InteractionEvent::PointerMove);
        widget.unmount();
        widget.handle_event(InteractionEvent::PointerMove);
        widget.handle_event(InteractionEvent::KeyPress);

        assert_eq!(widget.signals().mouse_move_count, 1);
        assert_eq!(widget.signals().keystroke_count, 0);
    }

    #[tokio::test]
    async fn widget_survives_backend_failure() {
        struct DownBackend;

        #[async_trait]
        impl FraudBackend for DownBackend {
            async fn classify(
                &self,
                _record: &FeatureRecord,
            ) -> Result<ClassifierVerdict, SubmitError> {
                Err(SubmitError::Network("connection refused".to_string()))
            }

            async fn append_log(
                &self,
                _record: &FeatureRecord,
                _classifier_is_fraud: bool,
            ) -> Result<LogVerdict, SubmitError> {
                Err(SubmitError::Network("connection refused".to_string()))
            }
        }

        let mut widget = widget();
        widget.click(&DownBackend).await;

        let ui = widget.ui_state();
        assert!(!ui.flagged);
        assert!(matches!(ui.last_notification, Some(Notification::Error(_))));

        // Still interactive: a later click against a healthy backend works
        let backend = FixedBackend {
            classifier_fraud: false,
            log_fraud: false,
        };
        widget.click(&backend).await;
        assert!(matches!(
            widget.ui_state().last_notification,
            Some(Notification::Success(_))
        ));
    }

    #[test]
    fn placement_follows_orientation() {
        assert_eq!(AdOrientation::Horizontal.placement(), "middle");
        assert_eq!(AdOrientation::Vertical.placement(), "sidebar");
    }

    #[test]
    fn unknown_ad_id_gets_default_creative() {
        let creative = AdCreative::for_ad("ad99");
        assert_eq!(creative.title, "Smart Device");
        assert_eq!(AdCreative::for_ad("ad2").title, "Secure Cloud Storage");
    }
}
