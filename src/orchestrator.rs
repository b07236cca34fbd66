use tracing::{info, warn};

use crate::backend::{FraudBackend, SubmitError};
use crate::features::FeatureRecord;

/// Per-click submission state. One machine instance serves a widget for
/// its lifetime; each click walks Idle -> AwaitingClassifier -> AwaitingLog
/// -> Resolved, or drops into Failed from either awaiting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    AwaitingClassifier,
    AwaitingLog,
    Resolved(ClickOutcome),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Combined verdict (classifier OR log endpoint) says fraud.
    FraudFlagged,
    /// No remote fraud verdict, but the local rate detector flagged spam.
    SpamWarning,
    Clean,
}

/// User-facing notification, in the severity tiers the widget renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error(String),
    Warning(String),
    Success(String),
}

/// What the widget should do after a click submission finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickResolution {
    /// True only when the combined verdict is fraud. Transport failures
    /// fail open and leave the flagged state untouched.
    pub flag_widget: bool,
    pub notification: Notification,
}

pub struct SubmissionOrchestrator {
    state: SubmissionState,
}

impl SubmissionOrchestrator {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Drive one click through the submission chain: classifier first, then
    /// the log endpoint with the classifier's verdict merged in. The two
    /// verdicts are independent signals and are combined by logical OR.
    ///
    /// Single best-effort attempt; no retry on either call.
    pub async fn submit(
        &mut self,
        backend: &dyn FraudBackend,
        record: FeatureRecord,
        spam_flagged: bool,
    ) -> ClickResolution {
        self.state = SubmissionState::AwaitingClassifier;

        let classifier = match backend.classify(&record).await {
            Ok(verdict) => verdict,
            Err(e) => return self.fail(e),
        };

        self.state = SubmissionState::AwaitingLog;

        let log = match backend.append_log(&record, classifier.is_fraud).await {
            Ok(verdict) => verdict,
            Err(e) => return self.fail(e),
        };

        let combined_fraud = log.is_fraud || classifier.is_fraud;

        let (outcome, resolution) = if log.is_fraud {
            (
                ClickOutcome::FraudFlagged,
                ClickResolution {
                    flag_widget: true,
                    notification: Notification::Error(
                        "Rapid clicking detected! This appears to be fraud.".to_string(),
                    ),
                },
            )
        } else if classifier.is_fraud {
            (
                ClickOutcome::FraudFlagged,
                ClickResolution {
                    flag_widget: true,
                    notification: Notification::Error(
                        "This click appears suspicious!".to_string(),
                    ),
                },
            )
        } else if spam_flagged {
            (
                ClickOutcome::SpamWarning,
                ClickResolution {
                    flag_widget: false,
                    notification: Notification::Warning(
                        "Too many clicks! Please slow down.".to_string(),
                    ),
                },
            )
        } else {
            (
                ClickOutcome::Clean,
                ClickResolution {
                    flag_widget: false,
                    notification: Notification::Success(
                        "Redirecting to advertiser...".to_string(),
                    ),
                },
            )
        };

        self.state = SubmissionState::Resolved(outcome);
        info!(
            "click resolved: outcome={:?} combined_fraud={} probability={:.2}",
            outcome, combined_fraud, classifier.fraud_probability
        );

        resolution
    }

    /// Transport failure from either awaiting state. Fails open: a generic
    /// notification, no change to the flagged state, widget stays usable.
    fn fail(&mut self, error: SubmitError) -> ClickResolution {
        warn!("click submission failed in {:?}: {}", self.state, error);
        self.state = SubmissionState::Failed;
        ClickResolution {
            flag_widget: false,
            notification: Notification::Error(
                "Error processing click data. Please try again.".to_string(),
            ),
        }
    }
}

impl Default for SubmissionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
