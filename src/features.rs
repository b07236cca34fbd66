use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signals::SessionSignals;

/// Coarse local-hour bucket. Boundaries are fixed: [5,12) morning,
/// [12,17) afternoon, [17,21) evening, everything else night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

/// Static environment fingerprint captured once at widget mount.
///
/// The VPN/proxy fields mirror what the host page can actually observe
/// (connection-type hint, automation flag). They are low-confidence
/// placeholder signals, forwarded as-is and never strengthened locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub browser: String,
    pub operating_system: String,
    pub max_touch_points: u8,
    pub vpn_connection_hint: bool,
    pub automation_flag_present: bool,
}

impl DeviceProfile {
    pub fn device_class(&self) -> DeviceClass {
        if self.max_touch_points > 1 {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            browser: "Chromium".to_string(),
            operating_system: "Linux".to_string(),
            max_touch_points: 0,
            vpn_connection_hint: false,
            automation_flag_present: false,
        }
    }
}

/// Instantaneous inputs for a single click.
#[derive(Debug, Clone)]
pub struct ClickContext {
    pub timestamp: DateTime<Utc>,
    /// Local hour 0-23 at the time of the click.
    pub local_hour: u32,
    /// Press-down instant, if one was observed before the click.
    pub press_ms: Option<f64>,
    /// Release instant (the click itself).
    pub release_ms: f64,
    pub ad_position: String,
}

/// One flattened behavioral snapshot per click. Field names are pinned to
/// the classifier's wire contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub timestamp: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
    pub device_type: DeviceClass,
    pub browser: String,
    pub operating_system: String,
    pub ad_position: String,
    pub device_ip_reputation: String,
    pub scroll_depth: u8,
    pub mouse_movement: u64,
    pub keystrokes_detected: u64,
    pub click_duration: f64,
    pub time_on_site: u64,
    pub click_frequency: usize,
    pub bot_likelihood_score: f64,
    #[serde(rename = "VPN_usage")]
    pub vpn_usage: u8,
    pub proxy_usage: u8,
}

/// Build the immutable per-click snapshot from the current collector
/// readings and the instantaneous click context. Pure: no clock reads, no
/// mutation of session state.
pub fn build_feature_record(
    signals: &SessionSignals,
    click_frequency: usize,
    bot_likelihood_score: f64,
    profile: &DeviceProfile,
    ctx: &ClickContext,
) -> FeatureRecord {
    // Synthetic clicks arrive without a press-down; duration 0 is the
    // documented value for that case, not an error.
    let click_duration = ctx
        .press_ms
        .map(|press| (ctx.release_ms - press).max(0.0))
        .unwrap_or(0.0);

    FeatureRecord {
        timestamp: ctx.timestamp,
        time_of_day: TimeOfDay::from_hour(ctx.local_hour),
        device_type: profile.device_class(),
        browser: profile.browser.clone(),
        operating_system: profile.operating_system.clone(),
        ad_position: ctx.ad_position.clone(),
        device_ip_reputation: "neutral".to_string(),
        scroll_depth: signals.scroll_depth_percent,
        mouse_movement: signals.mouse_move_count,
        keystrokes_detected: signals.keystroke_count,
        click_duration,
        time_on_site: signals.dwell_seconds,
        click_frequency,
        bot_likelihood_score,
        vpn_usage: profile.vpn_connection_hint as u8,
        proxy_usage: profile.automation_flag_present as u8,
    }
}
