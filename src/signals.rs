use tracing::debug;

/// Behavioral counters for one widget session.
///
/// Each field is written by exactly one collector and read by the feature
/// builder. Counters never decrement; scroll depth is last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct SessionSignals {
    pub scroll_depth_percent: u8,
    pub mouse_move_count: u64,
    pub keystroke_count: u64,
    pub dwell_seconds: u64,
}

/// A single user-interaction event delivered by the host page.
#[derive(Debug, Clone, Copy)]
pub enum InteractionEvent {
    /// Scroll position changed. `doc_height` is the full scrollable height.
    Scroll { scroll_y: f64, doc_height: f64 },
    PointerMove,
    KeyPress,
    /// Once-per-second host timer tick carrying the current time.
    Tick { now_ms: u64 },
}

/// The four passive collectors, attached for the lifetime of one mounted
/// widget. Construction attaches; `detach()` (or unmount) must be called
/// before the widget is discarded — a detached set drops all events.
pub struct CollectorSet {
    mount_ms: u64,
    attached: bool,
}

impl CollectorSet {
    pub fn attach(mount_ms: u64) -> Self {
        debug!("collectors attached at t={}", mount_ms);
        Self {
            mount_ms,
            attached: true,
        }
    }

    /// Route one event to its collector. Silent no-op once detached.
    pub fn observe(&mut self, event: InteractionEvent, signals: &mut SessionSignals) {
        if !self.attached {
            return;
        }

        match event {
            InteractionEvent::Scroll {
                scroll_y,
                doc_height,
            } => {
                signals.scroll_depth_percent = scroll_depth(scroll_y, doc_height);
            }
            InteractionEvent::PointerMove => {
                signals.mouse_move_count += 1;
            }
            InteractionEvent::KeyPress => {
                signals.keystroke_count += 1;
            }
            InteractionEvent::Tick { now_ms } => {
                let elapsed_ms = now_ms.saturating_sub(self.mount_ms);
                signals.dwell_seconds = (elapsed_ms as f64 / 1000.0).round() as u64;
            }
        }
    }

    pub fn detach(&mut self) {
        if self.attached {
            debug!("collectors detached");
            self.attached = false;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Percent of the document scrolled, rounded, clamped to 0-100. Telemetry is
/// best-effort: a zero or non-finite document height degrades to 0 instead
/// of failing the click path.
fn scroll_depth(scroll_y: f64, doc_height: f64) -> u8 {
    if doc_height <= 0.0 || !doc_height.is_finite() || !scroll_y.is_finite() {
        return 0;
    }
    let percent = (scroll_y / doc_height * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}
