use std::sync::Arc;
use taskroute_core::config::ModesConfig;
use taskroute_core::{PerformanceMode, PerformanceModeConfig};
use tracing::info;

use crate::scoring::{CosineSimilarity, PatternOnly, ScoringStrategy};

/// Mode config and scoring strategy captured at the start of a request.
#[derive(Clone)]
pub struct ModeSnapshot {
    pub config: PerformanceModeConfig,
    pub strategy: Arc<dyn ScoringStrategy>,
}

/// Holds the active performance mode.
///
/// Switching is synchronous and leaves the cache alone; entries are keyed by
/// mode, so a switch just starts reading from a different partition.
pub struct PerformanceModeController {
    modes: ModesConfig,
    active: PerformanceMode,
    pattern_only: Arc<dyn ScoringStrategy>,
    similarity: Arc<dyn ScoringStrategy>,
}

impl PerformanceModeController {
    pub fn new(modes: ModesConfig, initial: PerformanceMode, similarity_threshold: f64) -> Self {
        Self {
            modes,
            active: initial,
            pattern_only: Arc::new(PatternOnly),
            similarity: Arc::new(CosineSimilarity::new(similarity_threshold)),
        }
    }

    pub fn mode(&self) -> PerformanceMode {
        self.active
    }

    pub fn config(&self) -> PerformanceModeConfig {
        self.modes.resolve(self.active)
    }

    /// Switch modes, returning the previous one.
    pub fn set_mode(&mut self, mode: PerformanceMode) -> PerformanceMode {
        let previous = self.active;
        if previous != mode {
            info!(from = %previous, to = %mode, "Performance mode switched");
        }
        self.active = mode;
        previous
    }

    pub fn strategy(&self) -> Arc<dyn ScoringStrategy> {
        if self.config().use_vector_scoring {
            Arc::clone(&self.similarity)
        } else {
            Arc::clone(&self.pattern_only)
        }
    }

    pub fn snapshot(&self) -> ModeSnapshot {
        ModeSnapshot {
            config: self.config(),
            strategy: self.strategy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(initial: PerformanceMode) -> PerformanceModeController {
        PerformanceModeController::new(ModesConfig::default(), initial, 0.3)
    }

    #[test]
    fn test_strategy_follows_mode() {
        let mut c = controller(PerformanceMode::Fast);
        assert_eq!(c.strategy().name(), "pattern_only");

        c.set_mode(PerformanceMode::Balanced);
        assert_eq!(c.strategy().name(), "pattern_only");

        c.set_mode(PerformanceMode::Quality);
        assert_eq!(c.strategy().name(), "cosine_similarity");
        assert!(c.config().use_vector_scoring);
    }

    #[test]
    fn test_set_mode_returns_previous() {
        let mut c = controller(PerformanceMode::Balanced);
        assert_eq!(c.set_mode(PerformanceMode::Quality), PerformanceMode::Balanced);
        assert_eq!(c.set_mode(PerformanceMode::Quality), PerformanceMode::Quality);
        assert_eq!(c.mode(), PerformanceMode::Quality);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_switches() {
        let mut c = controller(PerformanceMode::Fast);
        let snap = c.snapshot();
        c.set_mode(PerformanceMode::Quality);
        assert_eq!(snap.config.mode, PerformanceMode::Fast);
        assert_eq!(snap.config.max_response_tokens, 40);
        assert_eq!(snap.strategy.name(), "pattern_only");
    }
}
