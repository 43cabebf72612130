//! # Viewer Toggle State Machine
//!
//! Pure per-session state for the canvas viewer: which detection features
//! are visible, which are mid-activation, and which external calls are
//! still authoritative.
//!
//! Each detection kind moves `Off → Activating → On` when the user enables
//! it, and back to `Off` on disable or failure. The external detection call
//! happens once per kind per session: the first enable issues it, later
//! enables only flip the flag.
//!
//! ## Stale-response guard
//!
//! Every issued call carries a per-kind sequence number. A completion (or
//! failure) only applies if the kind is still `Activating` with that exact
//! sequence number, i.e. the latest issued. A fast disable/enable cycle bumps
//! the sequence, so the superseded call's result is discarded instead of
//! re-enabling a layer the user turned off. The app layer additionally
//! aborts the superseded task; the guard here makes correctness independent
//! of that cancellation.
//!
//! This type is deliberately side-effect free. Transitions return
//! instruction values ([`Enable`], [`Completion`]) and the app layer
//! performs the network and storage work.

use crate::types::{DetectionKind, DoorToggle, LayerFlags};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// PHASES AND TRANSITION RESULTS
// =============================================================================

/// Activation phase of one detection kind within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPhase {
    /// Not visible; no call in flight.
    Off,
    /// User enabled the kind; the external detection call is in flight.
    Activating { seq: u64 },
    /// Detection completed; layer is visible.
    On,
}

/// What the app must do after an enable transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enable {
    /// First activation this session: issue the detection call tagged with
    /// this sequence number.
    StartDetection { seq: u64 },
    /// Already activated (or detection already pending): just re-resolve.
    Visible,
    /// A call for this kind is already in flight; nothing new to issue.
    Pending,
}

/// Whether a completion or failure was still authoritative when it landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was the latest issued call; state was updated.
    Applied,
    /// A newer call or a disable superseded this result; state unchanged.
    Stale,
}

// =============================================================================
// VIEWER STATE
// =============================================================================

/// Volatile state of one open viewer session.
///
/// Never persisted; a page reload opens a fresh session with everything
/// off, matching the contract that visibility flags reset on reload.
#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    flags: LayerFlags,
    phases: BTreeMap<DetectionKind, LayerPhase>,
    /// Latest issued sequence number per kind.
    seqs: BTreeMap<DetectionKind, u64>,
    /// Kinds whose detection completed successfully this session.
    activated: BTreeSet<DetectionKind>,
    current_page: usize,
    next_seq: u64,
}

impl ViewerState {
    /// Create a fresh session: all flags off, page 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current visibility flags.
    #[must_use]
    pub const fn flags(&self) -> &LayerFlags {
        &self.flags
    }

    /// Current page index.
    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    /// Switch the session to another page.
    pub const fn set_page(&mut self, page: usize) {
        self.current_page = page;
    }

    /// Phase of one detection kind.
    #[must_use]
    pub fn phase(&self, kind: DetectionKind) -> LayerPhase {
        self.phases.get(&kind).copied().unwrap_or(LayerPhase::Off)
    }

    /// Whether a detection call for the kind is in flight.
    #[must_use]
    pub fn is_processing(&self, kind: DetectionKind) -> bool {
        matches!(self.phase(kind), LayerPhase::Activating { .. })
    }

    /// All kinds currently mid-activation.
    #[must_use]
    pub fn processing(&self) -> Vec<DetectionKind> {
        DetectionKind::ALL
            .into_iter()
            .filter(|kind| self.is_processing(*kind))
            .collect()
    }

    /// User enabled a detection kind.
    pub fn enable(&mut self, kind: DetectionKind) -> Enable {
        match self.phase(kind) {
            LayerPhase::Activating { .. } => Enable::Pending,
            LayerPhase::On => {
                self.flags.set(kind, true);
                Enable::Visible
            }
            LayerPhase::Off => {
                if self.activated.contains(&kind) {
                    // Detection already ran this session; re-enabling is a
                    // pure flag flip.
                    self.phases.insert(kind, LayerPhase::On);
                    self.flags.set(kind, true);
                    Enable::Visible
                } else {
                    self.next_seq += 1;
                    let seq = self.next_seq;
                    self.seqs.insert(kind, seq);
                    self.phases.insert(kind, LayerPhase::Activating { seq });
                    Enable::StartDetection { seq }
                }
            }
        }
    }

    /// User disabled a detection kind. Any in-flight call for it becomes
    /// stale; the layer's stored overlay data is untouched.
    pub fn disable(&mut self, kind: DetectionKind) {
        self.phases.insert(kind, LayerPhase::Off);
        self.flags.set(kind, false);
    }

    /// A detection call finished successfully.
    pub fn complete(&mut self, kind: DetectionKind, seq: u64) -> Completion {
        if !self.is_latest(kind, seq) {
            return Completion::Stale;
        }
        self.phases.insert(kind, LayerPhase::On);
        self.flags.set(kind, true);
        self.activated.insert(kind);
        Completion::Applied
    }

    /// A detection call failed. The kind returns to `Off` and stays
    /// un-activated so the next enable issues a fresh call.
    pub fn fail(&mut self, kind: DetectionKind, seq: u64) -> Completion {
        if !self.is_latest(kind, seq) {
            return Completion::Stale;
        }
        self.phases.insert(kind, LayerPhase::Off);
        self.flags.set(kind, false);
        Completion::Applied
    }

    /// Flip one door/window sub-toggle. Only changes what the resolver
    /// derives; detection data is untouched.
    pub const fn set_door_toggle(&mut self, which: DoorToggle, on: bool) {
        self.flags.doors.set(which, on);
    }

    /// A result is authoritative only while the kind is still `Activating`
    /// with the same sequence number that was issued for it.
    fn is_latest(&self, kind: DetectionKind, seq: u64) -> bool {
        matches!(self.phase(kind), LayerPhase::Activating { seq: current } if current == seq)
            && self.seqs.get(&kind) == Some(&seq)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_all_off() {
        let state = ViewerState::new();
        for kind in DetectionKind::ALL {
            assert_eq!(state.phase(kind), LayerPhase::Off);
            assert!(!state.flags().is_visible(kind));
        }
        assert_eq!(state.current_page(), 0);
    }

    #[test]
    fn first_enable_starts_detection() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq } = state.enable(DetectionKind::WallColor) else {
            panic!("expected StartDetection");
        };
        assert!(state.is_processing(DetectionKind::WallColor));
        // Flag stays off until the call completes.
        assert!(!state.flags().is_visible(DetectionKind::WallColor));

        assert_eq!(state.complete(DetectionKind::WallColor, seq), Completion::Applied);
        assert_eq!(state.phase(DetectionKind::WallColor), LayerPhase::On);
        assert!(state.flags().is_visible(DetectionKind::WallColor));
    }

    #[test]
    fn enable_while_pending_issues_nothing() {
        let mut state = ViewerState::new();
        let _ = state.enable(DetectionKind::RoomArea);
        assert_eq!(state.enable(DetectionKind::RoomArea), Enable::Pending);
    }

    #[test]
    fn reenable_after_success_skips_detection() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq } = state.enable(DetectionKind::FireAlarm) else {
            panic!("expected StartDetection");
        };
        state.complete(DetectionKind::FireAlarm, seq);
        state.disable(DetectionKind::FireAlarm);

        // One detection per session: the second enable is a flag flip.
        assert_eq!(state.enable(DetectionKind::FireAlarm), Enable::Visible);
        assert_eq!(state.phase(DetectionKind::FireAlarm), LayerPhase::On);
    }

    #[test]
    fn disable_makes_inflight_completion_stale() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq } = state.enable(DetectionKind::ExclusionZones) else {
            panic!("expected StartDetection");
        };
        state.disable(DetectionKind::ExclusionZones);

        // The late completion must not re-enable the layer.
        assert_eq!(
            state.complete(DetectionKind::ExclusionZones, seq),
            Completion::Stale
        );
        assert_eq!(state.phase(DetectionKind::ExclusionZones), LayerPhase::Off);
        assert!(!state.flags().is_visible(DetectionKind::ExclusionZones));
    }

    #[test]
    fn fast_disable_enable_discards_superseded_call() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq: seq1 } = state.enable(DetectionKind::RoomNumber) else {
            panic!("expected StartDetection");
        };
        state.disable(DetectionKind::RoomNumber);
        let Enable::StartDetection { seq: seq2 } = state.enable(DetectionKind::RoomNumber) else {
            panic!("expected second StartDetection");
        };
        assert_ne!(seq1, seq2);

        // The first call's completion is stale; the second applies.
        assert_eq!(state.complete(DetectionKind::RoomNumber, seq1), Completion::Stale);
        assert!(state.is_processing(DetectionKind::RoomNumber));
        assert_eq!(state.complete(DetectionKind::RoomNumber, seq2), Completion::Applied);
        assert_eq!(state.phase(DetectionKind::RoomNumber), LayerPhase::On);
    }

    #[test]
    fn failure_returns_to_off_and_allows_retry() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq } = state.enable(DetectionKind::WallColor) else {
            panic!("expected StartDetection");
        };
        assert_eq!(state.fail(DetectionKind::WallColor, seq), Completion::Applied);
        assert_eq!(state.phase(DetectionKind::WallColor), LayerPhase::Off);

        // Failure did not mark the kind activated: enabling again issues a
        // fresh call rather than silently showing nothing.
        assert!(matches!(
            state.enable(DetectionKind::WallColor),
            Enable::StartDetection { .. }
        ));
    }

    #[test]
    fn stale_failure_is_ignored() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq: seq1 } = state.enable(DetectionKind::DoorsWindows) else {
            panic!("expected StartDetection");
        };
        state.disable(DetectionKind::DoorsWindows);
        let Enable::StartDetection { seq: seq2 } = state.enable(DetectionKind::DoorsWindows) else {
            panic!("expected StartDetection");
        };

        assert_eq!(state.fail(DetectionKind::DoorsWindows, seq1), Completion::Stale);
        assert!(state.is_processing(DetectionKind::DoorsWindows));
        assert_eq!(state.complete(DetectionKind::DoorsWindows, seq2), Completion::Applied);
    }

    #[test]
    fn doors_completion_enables_all_sub_toggles() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq } = state.enable(DetectionKind::DoorsWindows) else {
            panic!("expected StartDetection");
        };
        state.complete(DetectionKind::DoorsWindows, seq);
        assert!(state.flags().doors.single_doors);
        assert!(state.flags().doors.double_doors);
        assert!(state.flags().doors.windows);

        state.set_door_toggle(DoorToggle::Windows, false);
        assert!(!state.flags().doors.windows);
        assert!(state.flags().doors.single_doors);
    }

    #[test]
    fn page_switch_preserves_toggle_state() {
        let mut state = ViewerState::new();
        let Enable::StartDetection { seq } = state.enable(DetectionKind::WallColor) else {
            panic!("expected StartDetection");
        };
        state.complete(DetectionKind::WallColor, seq);
        state.set_page(3);
        assert_eq!(state.current_page(), 3);
        assert!(state.flags().is_visible(DetectionKind::WallColor));
    }
}
