use serde::{Deserialize, Serialize};

use crate::signals::SessionSignals;

/// Tunable weights and thresholds for the local heuristic score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub spam_weight: f64,
    pub low_movement_weight: f64,
    pub heavy_keystroke_weight: f64,
    /// Pointer moves per dwell second below which the movement rule fires.
    pub movement_rate_floor: f64,
    /// Keystroke count above which the keystroke rule fires.
    pub keystroke_ceiling: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            spam_weight: 0.7,
            low_movement_weight: 0.2,
            heavy_keystroke_weight: 0.1,
            movement_rate_floor: 2.0,
            keystroke_ceiling: 50,
        }
    }
}

/// Deterministic weighted-rule bot-likelihood scorer.
///
/// The rules are additive and independent: each one fires or not on its
/// own, and the sum is clamped to [0, 1]. This is a local heuristic,
/// separate from the remote classifier's probability.
pub struct BotScorer {
    config: ScorerConfig,
}

impl BotScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, signals: &SessionSignals, spam_flagged: bool) -> f64 {
        let mut score = 0.0;

        if spam_flagged {
            score += self.config.spam_weight;
        }

        // Bots tend to click without organic pointer travel. Dwell is
        // floored at one second so a click in the first second does not
        // divide by zero.
        let movement_rate =
            signals.mouse_move_count as f64 / signals.dwell_seconds.max(1) as f64;
        if movement_rate < self.config.movement_rate_floor {
            score += self.config.low_movement_weight;
        }

        if signals.keystroke_count > self.config.keystroke_ceiling {
            score += self.config.heavy_keystroke_weight;
        }

        score.clamp(0.0, 1.0)
    }
}

impl Default for BotScorer {
    fn default() -> Self {
        Self::new(ScorerConfig::default())
    }
}
