//! # Layer Resolver
//!
//! Decides which single layer the viewer renders for a page, given the
//! session's visibility flags and the project's canvas document.
//!
//! The precedence order is a deliberate total order, highest first:
//! fire alarms, exclusion zones, room numbers, room areas, wall color,
//! then the doors/windows combination derived from the three sub-toggles,
//! and finally the base page as the universal fallback.
//!
//! A layer is only eligible when it is both flagged visible AND has a
//! non-empty overlay URL for the page: flags gate what the user asked for,
//! data gates what detection has produced. Out-of-range pages simply fall
//! through to `Pages`. Pure functions; no errors are possible.

use crate::canvas::CanvasDoc;
use crate::types::{LayerFlags, LayerKind};

/// The five single-layer detection features in precedence order, paired
/// with their flag accessors. Doors/windows is handled separately because
/// its effective layer is computed from the sub-toggle truth table.
const PRECEDENCE: [(LayerKind, fn(&LayerFlags) -> bool); 5] = [
    (LayerKind::FireAlarm, |f| f.fire_alarm),
    (LayerKind::ExclusionZones, |f| f.exclusion_zones),
    (LayerKind::RoomNumber, |f| f.room_number),
    (LayerKind::RoomArea, |f| f.room_area),
    (LayerKind::WallColor, |f| f.wall_color),
];

/// Resolve the layer to render for `page`.
///
/// Returns `LayerKind::Pages` when nothing else is both visible and
/// populated, including for page indices beyond the document.
#[must_use]
pub fn resolve(page: usize, flags: &LayerFlags, doc: &CanvasDoc) -> LayerKind {
    for (kind, visible) in PRECEDENCE {
        if visible(flags) && doc.has_overlay(page, kind) {
            return kind;
        }
    }

    let combo = flags.doors.combination();
    if combo != LayerKind::Pages && doc.has_overlay(page, combo) {
        return combo;
    }

    LayerKind::Pages
}

/// Resolve the layer and its concrete URL for `page`.
///
/// The URL is `None` only when the resolved layer is `Pages` and the page
/// itself does not exist (or has an empty base URL), the one case where
/// there is genuinely nothing to draw.
#[must_use]
pub fn resolve_url<'a>(
    page: usize,
    flags: &LayerFlags,
    doc: &'a CanvasDoc,
) -> (LayerKind, Option<&'a str>) {
    let kind = resolve(page, flags, doc);
    (kind, doc.layer_url(page, kind))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectionKind, DoorWindowToggles};

    /// Two pages, every overlay populated on both.
    fn full_doc() -> CanvasDoc {
        let mut doc = CanvasDoc::new();
        doc.append_pages(vec![
            "https://cdn.test/p0.png".to_string(),
            "https://cdn.test/p1.png".to_string(),
        ])
        .expect("append");
        for page in 0..2 {
            for kind in LayerKind::OVERLAYS {
                doc.set_overlay(page, kind, format!("https://cdn.test/{}-{page}.png", kind.as_str()))
                    .expect("overlay");
            }
        }
        doc
    }

    #[test]
    fn no_flags_resolves_to_pages() {
        let doc = full_doc();
        assert_eq!(resolve(0, &LayerFlags::default(), &doc), LayerKind::Pages);
    }

    #[test]
    fn flag_without_data_falls_back_to_pages() {
        let mut doc = CanvasDoc::new();
        doc.append_pages(vec!["https://cdn.test/p0.png".to_string()])
            .expect("append");

        let mut flags = LayerFlags::default();
        flags.set(DetectionKind::FireAlarm, true);
        assert_eq!(resolve(0, &flags, &doc), LayerKind::Pages);
    }

    #[test]
    fn out_of_range_page_resolves_to_pages() {
        let doc = full_doc();
        let mut flags = LayerFlags::default();
        flags.set(DetectionKind::WallColor, true);
        assert_eq!(resolve(99, &flags, &doc), LayerKind::Pages);
        assert_eq!(resolve_url(99, &flags, &doc), (LayerKind::Pages, None));
    }

    #[test]
    fn higher_precedence_wins() {
        // fire alarm and room area both flagged and populated: fire alarm wins.
        let doc = full_doc();
        let mut flags = LayerFlags::default();
        flags.set(DetectionKind::FireAlarm, true);
        flags.set(DetectionKind::RoomArea, true);

        let (kind, url) = resolve_url(0, &flags, &doc);
        assert_eq!(kind, LayerKind::FireAlarm);
        assert_eq!(url, Some("https://cdn.test/fire_alarm_processing-0.png"));
    }

    #[test]
    fn wall_color_page_indexing() {
        // wall overlays on both pages; page 1 resolves to the page-1 URL.
        let mut doc = CanvasDoc::new();
        doc.append_pages(vec![
            "https://cdn.test/p0.png".to_string(),
            "https://cdn.test/p1.png".to_string(),
        ])
        .expect("append");
        doc.set_overlay(0, LayerKind::WallColor, "urlA").expect("overlay");
        doc.set_overlay(1, LayerKind::WallColor, "urlB").expect("overlay");

        let mut flags = LayerFlags::default();
        flags.set(DetectionKind::WallColor, true);

        let (kind, url) = resolve_url(1, &flags, &doc);
        assert_eq!(kind, LayerKind::WallColor);
        assert_eq!(url, Some("urlB"));
    }

    #[test]
    fn door_truth_table_resolves_all_seven_combinations() {
        let doc = full_doc();
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
            let flags = LayerFlags {
                doors: DoorWindowToggles {
                    single_doors: single,
                    double_doors: double,
                    windows,
                },
                ..LayerFlags::default()
            };
            assert_eq!(resolve(0, &flags, &doc), expected);
        }
    }

    #[test]
    fn door_combination_without_data_falls_back() {
        let mut doc = CanvasDoc::new();
        doc.append_pages(vec!["https://cdn.test/p0.png".to_string()])
            .expect("append");
        // Only the complete combination is populated.
        doc.set_overlay(0, LayerKind::CompleteDoorsAndWindows, "https://cdn.test/all.png")
            .expect("overlay");

        // Sub-toggle set resolving to single_doors has no data → pages.
        let flags = LayerFlags {
            doors: DoorWindowToggles {
                single_doors: true,
                double_doors: false,
                windows: false,
            },
            ..LayerFlags::default()
        };
        assert_eq!(resolve(0, &flags, &doc), LayerKind::Pages);
    }

    #[test]
    fn disable_is_flag_gated_not_data_gated() {
        // Overlay data stays in the document; clearing the flag alone
        // removes the layer from resolution.
        let doc = full_doc();
        let mut flags = LayerFlags::default();
        flags.set(DetectionKind::ExclusionZones, true);
        assert_eq!(resolve(0, &flags, &doc), LayerKind::ExclusionZones);

        flags.set(DetectionKind::ExclusionZones, false);
        assert_eq!(resolve(0, &flags, &doc), LayerKind::Pages);
        assert!(doc.has_overlay(0, LayerKind::ExclusionZones));
    }

    #[test]
    fn write_then_resolve_round_trip() {
        let mut doc = CanvasDoc::new();
        doc.append_pages(vec![
            "https://cdn.test/p0.png".to_string(),
            "https://cdn.test/p1.png".to_string(),
            "https://cdn.test/p2.png".to_string(),
        ])
        .expect("append");
        doc.set_overlay(2, LayerKind::RoomNumber, "https://cdn.test/rn-2.png")
            .expect("overlay");

        let mut flags = LayerFlags::default();
        flags.set(DetectionKind::RoomNumber, true);

        assert_eq!(
            resolve_url(2, &flags, &doc),
            (LayerKind::RoomNumber, Some("https://cdn.test/rn-2.png"))
        );
    }
}
