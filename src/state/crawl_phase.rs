/// Crawl phase definitions for one Seed Job
///
/// A job moves strictly forward: `Seeded -> Expanding -> Drained`.
use crate::ScoutError;
use std::fmt;

/// Represents the current phase of a Seed Job's crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// The seed URL has been claimed and the allowed-domain set initialised
    Seeded,

    /// Claimed URLs are being fetched and expanded
    Expanding,

    /// No claimed-but-unprocessed URLs remain, or the wall-clock ceiling was hit
    Drained,
}

impl CrawlPhase {
    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Drained)
    }

    /// Checks if a transition from this phase to another is valid
    ///
    /// # Valid Transitions
    ///
    /// - Seeded → Expanding
    /// - Seeded → Drained (the ceiling can fire before the first fetch completes)
    /// - Expanding → Drained
    pub fn can_transition_to(&self, target: CrawlPhase) -> bool {
        matches!(
            (self, target),
            (Self::Seeded, Self::Expanding)
                | (Self::Seeded, Self::Drained)
                | (Self::Expanding, Self::Drained)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Expanding => "expanding",
            Self::Drained => "drained",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the phase of a single job and enforces forward-only transitions
#[derive(Debug)]
pub struct PhaseTracker {
    current: CrawlPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: CrawlPhase::Seeded,
        }
    }

    pub fn current(&self) -> CrawlPhase {
        self.current
    }

    /// Moves to `target`, or returns `ScoutError::InvalidTransition`
    pub fn advance(&mut self, target: CrawlPhase) -> Result<(), ScoutError> {
        if !self.current.can_transition_to(target) {
            return Err(ScoutError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.current, target);
        self.current = target;
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(CrawlPhase::Seeded.can_transition_to(CrawlPhase::Expanding));
        assert!(CrawlPhase::Seeded.can_transition_to(CrawlPhase::Drained));
        assert!(CrawlPhase::Expanding.can_transition_to(CrawlPhase::Drained));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!CrawlPhase::Expanding.can_transition_to(CrawlPhase::Seeded));
        assert!(!CrawlPhase::Drained.can_transition_to(CrawlPhase::Expanding));
        assert!(!CrawlPhase::Drained.can_transition_to(CrawlPhase::Seeded));
    }

    #[test]
    fn test_self_transitions_rejected() {
        for phase in [CrawlPhase::Seeded, CrawlPhase::Expanding, CrawlPhase::Drained] {
            assert!(!phase.can_transition_to(phase));
        }
    }

    #[test]
    fn test_tracker_advances() {
        let mut tracker = PhaseTracker::new();
        assert_eq!(tracker.current(), CrawlPhase::Seeded);
        tracker.advance(CrawlPhase::Expanding).unwrap();
        tracker.advance(CrawlPhase::Drained).unwrap();
        assert!(tracker.current().is_terminal());
    }

    #[test]
    fn test_tracker_rejects_illegal_move() {
        let mut tracker = PhaseTracker::new();
        tracker.advance(CrawlPhase::Drained).unwrap();
        let err = tracker.advance(CrawlPhase::Expanding).unwrap_err();
        assert!(matches!(
            err,
            ScoutError::InvalidTransition {
                from: CrawlPhase::Drained,
                to: CrawlPhase::Expanding
            }
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlPhase::Expanding.to_string(), "expanding");
    }
}
