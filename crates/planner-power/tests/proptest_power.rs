//! Property-based tests for relay propagation.

use planner_core::geometry::Rect;
use planner_core::layout::Layout;
use planner_core::test_utils::*;
use planner_power::{in_range, item_region, propagate_power};
use proptest::prelude::*;

/// Relay positions anywhere on the 20x20 sample grid. Placement rules are
/// not enforced here; propagation must not depend on them.
fn arb_relays() -> impl Strategy<Value = Vec<(i32, i32)>> {
    proptest::collection::vec((0..20i32, 0..20i32), 0..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every relay in range of an energized relay (or of the core) is itself
    /// energized, and every energized relay has such a neighbour.
    #[test]
    fn energized_set_is_closed_and_supported(
        positions in arb_relays(),
        range in 0..8u32,
    ) {
        let catalog = sample_catalog();
        let mut config = small_config();
        config.power_range = range;
        let mut layout = Layout::new();
        let ids: Vec<_> = positions
            .iter()
            .map(|&(x, y)| place(&mut layout, relay(), x, y))
            .collect();

        let coverage = propagate_power(&catalog, &layout, &config);
        let region = |id| item_region(&catalog, &layout, id).unwrap();

        for &id in &ids {
            let here: Rect = region(id);
            let fed_by_core = in_range(&config.core, &here, range);
            let fed_by_relay = ids
                .iter()
                .filter(|&&other| other != id && coverage.is_energized(other))
                .any(|&other| in_range(&region(other), &here, range));

            if coverage.is_energized(id) {
                prop_assert!(fed_by_core || fed_by_relay);
            } else {
                prop_assert!(!fed_by_core && !fed_by_relay);
            }
        }
    }

    /// Widening the range never de-energizes a relay.
    #[test]
    fn coverage_is_monotonic_in_range(
        positions in arb_relays(),
        range in 0..7u32,
    ) {
        let catalog = sample_catalog();
        let mut layout = Layout::new();
        for &(x, y) in &positions {
            place(&mut layout, relay(), x, y);
        }
        place(&mut layout, miner(), 0, 0);
        place(&mut layout, assembler(), 16, 16);

        let mut narrow = small_config();
        narrow.power_range = range;
        let mut wide = small_config();
        wide.power_range = range + 1;

        let a = propagate_power(&catalog, &layout, &narrow);
        let b = propagate_power(&catalog, &layout, &wide);
        prop_assert!(a.energized_relays.is_subset(&b.energized_relays));
        prop_assert!(a.powered.is_subset(&b.powered));
    }
}
