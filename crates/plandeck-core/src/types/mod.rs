//! # Core Type Definitions
//!
//! This module contains the closed vocabulary of the Plandeck canvas engine:
//! - Layer kinds (`LayerKind`): everything the viewer can render for a page
//! - Detection kinds (`DetectionKind`): the togglable detection features
//! - Door/window sub-toggles (`DoorWindowToggles`) and their combination table
//! - Visibility flags (`LayerFlags`): volatile, per-viewer-session state
//! - Error types (`PlandeckError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Carry no clocks, randomness, or floating-point state

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// LAYER KIND
// =============================================================================

/// One renderable layer for a page: the base page image or one of the twelve
/// detection overlays.
///
/// The serde names are the wire vocabulary and are fixed, including the
/// historical casing of `exclusion_Zones_processing`, because stored
/// documents and API clients both speak them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    /// The base page image. Always present; the universal fallback.
    #[serde(rename = "pages")]
    Pages,
    #[serde(rename = "complete_doors_and_windows")]
    CompleteDoorsAndWindows,
    #[serde(rename = "single_doors")]
    SingleDoors,
    #[serde(rename = "double_doors")]
    DoubleDoors,
    #[serde(rename = "windows")]
    Windows,
    #[serde(rename = "single_doors_and_windows")]
    SingleDoorsAndWindows,
    #[serde(rename = "single_doors_and_double_doors")]
    SingleDoorsAndDoubleDoors,
    #[serde(rename = "double_doors_and_windows")]
    DoubleDoorsAndWindows,
    #[serde(rename = "wall_color_processing")]
    WallColor,
    #[serde(rename = "room_area_processing")]
    RoomArea,
    #[serde(rename = "room_n_processing")]
    RoomNumber,
    #[serde(rename = "exclusion_Zones_processing")]
    ExclusionZones,
    #[serde(rename = "fire_alarm_processing")]
    FireAlarm,
}

impl LayerKind {
    /// All overlay kinds, i.e. every kind except `Pages`.
    pub const OVERLAYS: [LayerKind; 12] = [
        LayerKind::CompleteDoorsAndWindows,
        LayerKind::SingleDoors,
        LayerKind::DoubleDoors,
        LayerKind::Windows,
        LayerKind::SingleDoorsAndWindows,
        LayerKind::SingleDoorsAndDoubleDoors,
        LayerKind::DoubleDoorsAndWindows,
        LayerKind::WallColor,
        LayerKind::RoomArea,
        LayerKind::RoomNumber,
        LayerKind::ExclusionZones,
        LayerKind::FireAlarm,
    ];

    /// The wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pages => "pages",
            Self::CompleteDoorsAndWindows => "complete_doors_and_windows",
            Self::SingleDoors => "single_doors",
            Self::DoubleDoors => "double_doors",
            Self::Windows => "windows",
            Self::SingleDoorsAndWindows => "single_doors_and_windows",
            Self::SingleDoorsAndDoubleDoors => "single_doors_and_double_doors",
            Self::DoubleDoorsAndWindows => "double_doors_and_windows",
            Self::WallColor => "wall_color_processing",
            Self::RoomArea => "room_area_processing",
            Self::RoomNumber => "room_n_processing",
            Self::ExclusionZones => "exclusion_Zones_processing",
            Self::FireAlarm => "fire_alarm_processing",
        }
    }

    /// Parse a wire name. Unknown names yield `None`; callers decide whether
    /// that is an error or a fallback to `Pages`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let kind = match s {
            "pages" => Self::Pages,
            "complete_doors_and_windows" => Self::CompleteDoorsAndWindows,
            "single_doors" => Self::SingleDoors,
            "double_doors" => Self::DoubleDoors,
            "windows" => Self::Windows,
            "single_doors_and_windows" => Self::SingleDoorsAndWindows,
            "single_doors_and_double_doors" => Self::SingleDoorsAndDoubleDoors,
            "double_doors_and_windows" => Self::DoubleDoorsAndWindows,
            "wall_color_processing" => Self::WallColor,
            "room_area_processing" => Self::RoomArea,
            "room_n_processing" => Self::RoomNumber,
            "exclusion_Zones_processing" => Self::ExclusionZones,
            "fire_alarm_processing" => Self::FireAlarm,
            _ => return None,
        };
        Some(kind)
    }
}

// =============================================================================
// DETECTION KIND
// =============================================================================

/// One togglable detection feature.
///
/// Coarser than `LayerKind`: a single feature may populate several layers
/// (doors/windows fills all seven combination overlays in one call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DetectionKind {
    #[serde(rename = "doors-windows")]
    DoorsWindows,
    #[serde(rename = "wall-color")]
    WallColor,
    #[serde(rename = "room-area")]
    RoomArea,
    #[serde(rename = "room-number")]
    RoomNumber,
    #[serde(rename = "exclusion-zones")]
    ExclusionZones,
    #[serde(rename = "fire-alarm")]
    FireAlarm,
}

impl DetectionKind {
    /// All detection kinds.
    pub const ALL: [DetectionKind; 6] = [
        DetectionKind::DoorsWindows,
        DetectionKind::WallColor,
        DetectionKind::RoomArea,
        DetectionKind::RoomNumber,
        DetectionKind::ExclusionZones,
        DetectionKind::FireAlarm,
    ];

    /// The wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DoorsWindows => "doors-windows",
            Self::WallColor => "wall-color",
            Self::RoomArea => "room-area",
            Self::RoomNumber => "room-number",
            Self::ExclusionZones => "exclusion-zones",
            Self::FireAlarm => "fire-alarm",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let kind = match s {
            "doors-windows" => Self::DoorsWindows,
            "wall-color" => Self::WallColor,
            "room-area" => Self::RoomArea,
            "room-number" => Self::RoomNumber,
            "exclusion-zones" => Self::ExclusionZones,
            "fire-alarm" => Self::FireAlarm,
            _ => return None,
        };
        Some(kind)
    }

    /// The single layer this feature's flag gates in the resolver.
    ///
    /// Doors/windows is the exception: its effective layer is derived from
    /// the three sub-toggles by truth table, so it maps to the complete
    /// combination here and the resolver consults the table instead.
    #[must_use]
    pub const fn primary_layer(self) -> LayerKind {
        match self {
            Self::DoorsWindows => LayerKind::CompleteDoorsAndWindows,
            Self::WallColor => LayerKind::WallColor,
            Self::RoomArea => LayerKind::RoomArea,
            Self::RoomNumber => LayerKind::RoomNumber,
            Self::ExclusionZones => LayerKind::ExclusionZones,
            Self::FireAlarm => LayerKind::FireAlarm,
        }
    }
}

// =============================================================================
// DOOR/WINDOW SUB-TOGGLES
// =============================================================================

/// The three independent door/window sub-toggles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct DoorWindowToggles {
    pub single_doors: bool,
    pub double_doors: bool,
    pub windows: bool,
}

/// Selector for one door/window sub-toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorToggle {
    SingleDoors,
    DoubleDoors,
    Windows,
}

impl DoorWindowToggles {
    /// All three toggles on.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            single_doors: true,
            double_doors: true,
            windows: true,
        }
    }

    /// Set one sub-toggle.
    pub const fn set(&mut self, which: DoorToggle, on: bool) {
        match which {
            DoorToggle::SingleDoors => self.single_doors = on,
            DoorToggle::DoubleDoors => self.double_doors = on,
            DoorToggle::Windows => self.windows = on,
        }
    }

    /// Map the three booleans to the layer that renders exactly that set of
    /// detections. All eight combinations are covered; no toggles means the
    /// base page.
    #[must_use]
    pub const fn combination(self) -> LayerKind {
        match (self.single_doors, self.double_doors, self.windows) {
            (true, true, true) => LayerKind::CompleteDoorsAndWindows,
            (true, true, false) => LayerKind::SingleDoorsAndDoubleDoors,
            (true, false, true) => LayerKind::SingleDoorsAndWindows,
            (false, true, true) => LayerKind::DoubleDoorsAndWindows,
            (true, false, false) => LayerKind::SingleDoors,
            (false, true, false) => LayerKind::DoubleDoors,
            (false, false, true) => LayerKind::Windows,
            (false, false, false) => LayerKind::Pages,
        }
    }
}

// =============================================================================
// VISIBILITY FLAGS
// =============================================================================

/// Per-viewer-session visibility flags.
///
/// Volatile by contract: never persisted, all-false for every new session.
/// The doors/windows group is represented by its three sub-toggles; the
/// effective doors/windows layer is derived via
/// [`DoorWindowToggles::combination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerFlags {
    pub fire_alarm: bool,
    pub exclusion_zones: bool,
    pub room_number: bool,
    pub room_area: bool,
    pub wall_color: bool,
    pub doors: DoorWindowToggles,
}

impl LayerFlags {
    /// Set the flag(s) for a detection kind. For doors/windows this sets all
    /// three sub-toggles at once, mirroring the group toggle.
    pub fn set(&mut self, kind: DetectionKind, on: bool) {
        match kind {
            DetectionKind::FireAlarm => self.fire_alarm = on,
            DetectionKind::ExclusionZones => self.exclusion_zones = on,
            DetectionKind::RoomNumber => self.room_number = on,
            DetectionKind::RoomArea => self.room_area = on,
            DetectionKind::WallColor => self.wall_color = on,
            DetectionKind::DoorsWindows => {
                self.doors = if on {
                    DoorWindowToggles::all()
                } else {
                    DoorWindowToggles::default()
                };
            }
        }
    }

    /// Whether the given detection kind is currently visible.
    /// Doors/windows counts as visible if any sub-toggle is on.
    #[must_use]
    pub const fn is_visible(&self, kind: DetectionKind) -> bool {
        match kind {
            DetectionKind::FireAlarm => self.fire_alarm,
            DetectionKind::ExclusionZones => self.exclusion_zones,
            DetectionKind::RoomNumber => self.room_number,
            DetectionKind::RoomArea => self.room_area,
            DetectionKind::WallColor => self.wall_color,
            DetectionKind::DoorsWindows => {
                self.doors.single_doors || self.doors.double_doors || self.doors.windows
            }
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Plandeck core.
///
/// - No silent failures
/// - Use `Result<T, PlandeckError>` for fallible operations
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum PlandeckError {
    /// The requested record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A request or document field failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A page index is outside the document's page list.
    #[error("Page index {page} out of range for {pages} pages")]
    PageOutOfRange { page: usize, pages: usize },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_kind_wire_names_round_trip() {
        for kind in LayerKind::OVERLAYS {
            assert_eq!(LayerKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(LayerKind::parse("pages"), Some(LayerKind::Pages));
        assert_eq!(LayerKind::parse("bogus"), None);
    }

    #[test]
    fn exclusion_zones_keeps_historical_casing() {
        assert_eq!(
            LayerKind::ExclusionZones.as_str(),
            "exclusion_Zones_processing"
        );
    }

    #[test]
    fn detection_kind_wire_names_round_trip() {
        for kind in DetectionKind::ALL {
            assert_eq!(DetectionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(DetectionKind::parse("walls"), None);
    }

    #[test]
    fn door_combination_truth_table_is_exhaustive() {
        let cases = [
            ((true, true, true), LayerKind::CompleteDoorsAndWindows),
            ((true, true, false), LayerKind::SingleDoorsAndDoubleDoors),
            ((true, false, true), LayerKind::SingleDoorsAndWindows),
            ((false, true, true), LayerKind::DoubleDoorsAndWindows),
            ((true, false, false), LayerKind::SingleDoors),
            ((false, true, false), LayerKind::DoubleDoors),
            ((false, false, true), LayerKind::Windows),
            ((false, false, false), LayerKind::Pages),
        ];
        for ((single, double, windows), expected) in cases {
            let toggles = DoorWindowToggles {
                single_doors: single,
                double_doors: double,
                windows,
            };
            assert_eq!(toggles.combination(), expected);
        }
    }

    #[test]
    fn flags_default_all_off() {
        let flags = LayerFlags::default();
        for kind in DetectionKind::ALL {
            assert!(!flags.is_visible(kind));
        }
    }

    #[test]
    fn flags_group_set_touches_all_door_toggles() {
        let mut flags = LayerFlags::default();
        flags.set(DetectionKind::DoorsWindows, true);
        assert_eq!(flags.doors, DoorWindowToggles::all());
        assert!(flags.is_visible(DetectionKind::DoorsWindows));

        flags.set(DetectionKind::DoorsWindows, false);
        assert!(!flags.is_visible(DetectionKind::DoorsWindows));
    }
}
