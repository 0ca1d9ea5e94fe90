// THEORY:
// The `DetectionTracker` is the pipeline's memory of "is something in the
// scene right now?". It is a two-state machine (Idle, Detected) driven by the
// per-frame verdict of the region filter, and it decides when that verdict is
// news worth logging.
//
// Rules:
// 1.  Only an Idle -> Detected edge is reportable. Staying detected, clearing,
//     and staying idle are all silent.
// 2.  An edge on the very first frame of a session is taken silently: the
//     object was "always there" as far as this session is concerned.
// 3.  The state always follows the current verdict, after the decision above.

const FIRST_FRAME: u64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectionState {
    #[default]
    Idle,
    Detected,
}

/// What happened to the detection flag on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Idle -> Detected. `report` is false when the edge is suppressed.
    Appeared { report: bool },
    /// Detected -> Idle.
    Cleared,
}

impl Transition {
    pub fn should_report(&self) -> bool {
        matches!(self, Transition::Appeared { report: true })
    }
}

#[derive(Debug, Default)]
pub struct DetectionTracker {
    state: DetectionState,
}

impl DetectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn is_detected(&self) -> bool {
        self.state == DetectionState::Detected
    }

    /// Feeds one frame's verdict. `frame_counter` is the 1-based index of the frame in its session.
    pub fn observe(&mut self, object_detected: bool, frame_counter: u64) -> Transition {
        let transition = match (self.state, object_detected) {
            (DetectionState::Idle, true) => Transition::Appeared {
                report: frame_counter != FIRST_FRAME,
            },
            (DetectionState::Detected, false) => Transition::Cleared,
            _ => Transition::Unchanged,
        };
        self.state = if object_detected {
            DetectionState::Detected
        } else {
            DetectionState::Idle
        };
        transition
    }

    pub fn reset(&mut self) {
        self.state = DetectionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rising_edges_report() {
        let mut t = DetectionTracker::new();
        assert_eq!(t.observe(false, 1), Transition::Unchanged);
        assert_eq!(t.observe(true, 2), Transition::Appeared { report: true });
        assert_eq!(t.observe(true, 3), Transition::Unchanged);
        assert_eq!(t.observe(false, 4), Transition::Cleared);
        assert_eq!(t.observe(false, 5), Transition::Unchanged);
        assert_eq!(t.observe(true, 6), Transition::Appeared { report: true });
    }

    #[test]
    fn first_frame_edge_is_silent() {
        let mut t = DetectionTracker::new();
        let first = t.observe(true, 1);
        assert_eq!(first, Transition::Appeared { report: false });
        assert!(!first.should_report());
        assert!(t.is_detected());
        assert_eq!(t.observe(false, 2), Transition::Cleared);
        assert!(t.observe(true, 3).should_report());
    }

    #[test]
    fn state_follows_every_verdict() {
        let mut t = DetectionTracker::new();
        for (i, verdict) in [true, false, false, true, true, false].into_iter().enumerate() {
            t.observe(verdict, i as u64 + 1);
            assert_eq!(t.is_detected(), verdict);
        }
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut t = DetectionTracker::new();
        t.observe(true, 7);
        t.reset();
        assert_eq!(t.state(), DetectionState::Idle);
    }
}
