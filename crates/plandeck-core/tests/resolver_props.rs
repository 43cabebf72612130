//! # Property-Based Tests
//!
//! Verification of the resolver's contract across arbitrary documents and
//! flag combinations.
//!
//! These tests ensure the resolver is total and its result is always
//! renderable: `pages` or a layer with a non-empty URL at that index.

use plandeck_core::{
    CanvasDoc, DetectionKind, DoorWindowToggles, LayerFlags, LayerKind, resolve, resolve_url,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Build a document with `page_count` pages and the given overlay set.
/// `overlay_mask[p][k]` decides whether overlay k exists on page p.
fn build_doc(page_count: usize, overlay_mask: &[Vec<bool>]) -> CanvasDoc {
    let mut doc = CanvasDoc::new();
    doc.append_pages((0..page_count).map(|i| format!("https://cdn.test/p{i}.png")))
        .expect("append");
    for (page, mask) in overlay_mask.iter().enumerate().take(page_count) {
        for (idx, present) in mask.iter().enumerate() {
            if *present {
                let kind = LayerKind::OVERLAYS[idx % LayerKind::OVERLAYS.len()];
                doc.set_overlay(page, kind, format!("https://cdn.test/{}-{page}.png", kind.as_str()))
                    .expect("overlay");
            }
        }
    }
    doc
}

fn arb_flags() -> impl Strategy<Value = LayerFlags> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(fire, zones, room_n, room_area, walls, single, double, windows)| LayerFlags {
                fire_alarm: fire,
                exclusion_zones: zones,
                room_number: room_n,
                room_area,
                wall_color: walls,
                doors: DoorWindowToggles {
                    single_doors: single,
                    double_doors: double,
                    windows,
                },
            },
        )
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The resolver is total: every (page, flags, doc) combination yields
    /// exactly one kind, and that kind is renderable.
    #[test]
    fn resolution_is_total_and_renderable(
        page_count in 0usize..6,
        overlay_mask in vec(vec(any::<bool>(), 12), 0..6),
        flags in arb_flags(),
        page in 0usize..10
    ) {
        let doc = build_doc(page_count, &overlay_mask);
        let kind = resolve(page, &flags, &doc);

        if kind != LayerKind::Pages {
            // Anything but pages must be backed by a non-empty URL.
            prop_assert!(doc.has_overlay(page, kind));
        }
    }

    /// resolve_url agrees with resolve, and its URL is non-empty whenever
    /// present.
    #[test]
    fn resolve_url_is_consistent(
        page_count in 0usize..6,
        overlay_mask in vec(vec(any::<bool>(), 12), 0..6),
        flags in arb_flags(),
        page in 0usize..10
    ) {
        let doc = build_doc(page_count, &overlay_mask);
        let (kind, url) = resolve_url(page, &flags, &doc);

        prop_assert_eq!(kind, resolve(page, &flags, &doc));
        if let Some(url) = url {
            prop_assert!(!url.is_empty());
        } else {
            // No URL only when the page itself is missing.
            prop_assert_eq!(kind, LayerKind::Pages);
            prop_assert!(page >= doc.page_count());
        }
    }

    /// The resolver is deterministic.
    #[test]
    fn resolution_is_deterministic(
        page_count in 0usize..6,
        overlay_mask in vec(vec(any::<bool>(), 12), 0..6),
        flags in arb_flags(),
        page in 0usize..10
    ) {
        let doc = build_doc(page_count, &overlay_mask);
        prop_assert_eq!(resolve(page, &flags, &doc), resolve(page, &flags, &doc));
    }

    /// With all overlays present, a fully-flagged page always resolves to
    /// the highest-precedence layer: fire alarms.
    #[test]
    fn full_flags_full_data_resolves_to_fire_alarm(page in 0usize..4) {
        let mask = vec![vec![true; 12]; 4];
        let doc = build_doc(4, &mask);
        let mut flags = LayerFlags::default();
        for kind in DetectionKind::ALL {
            flags.set(kind, true);
        }
        prop_assert_eq!(resolve(page, &flags, &doc), LayerKind::FireAlarm);
    }
}
