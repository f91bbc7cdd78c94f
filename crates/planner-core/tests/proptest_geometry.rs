//! Property-based tests for the rotation transform and AABB math.

use planner_core::geometry::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::North),
        Just(Direction::East),
        Just(Direction::South),
        Just(Direction::West),
    ]
}

fn arb_rotation() -> impl Strategy<Value = Rotation> {
    prop_oneof![
        Just(Rotation::None),
        Just(Rotation::Cw90),
        Just(Rotation::Cw180),
        Just(Rotation::Cw270),
    ]
}

/// Blueprint dimensions plus an offset inside them.
fn arb_offset_in_footprint() -> impl Strategy<Value = (u32, u32, GridPosition)> {
    (1..=10u32, 1..=10u32).prop_flat_map(|(w, h)| {
        (0..w as i32, 0..h as i32).prop_map(move |(x, y)| (w, h, GridPosition::new(x, y)))
    })
}

fn arb_rect() -> impl Strategy<Value = Rect> {
    (-20..20i32, -20..20i32, 1..8u32, 1..8u32).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Four quarter turns bring a facing back to where it started.
    #[test]
    fn direction_rotation_closure(dir in arb_direction()) {
        let mut d = dir;
        for _ in 0..4 {
            d = rotated_direction(d, Rotation::Cw90);
        }
        prop_assert_eq!(d, dir);
    }

    /// Four quarter turns bring a port offset back, with the footprint
    /// dimensions swapping on each turn.
    #[test]
    fn port_offset_rotation_closure((w, h, offset) in arb_offset_in_footprint()) {
        let (mut cw, mut ch) = (w, h);
        let mut p = offset;
        for _ in 0..4 {
            p = rotated_port_offset(p, cw, ch, Rotation::Cw90);
            let (nw, nh) = effective_dimensions(cw, ch, Rotation::Cw90);
            cw = nw;
            ch = nh;
        }
        prop_assert_eq!(p, offset);
        prop_assert_eq!((cw, ch), (w, h));
    }

    /// Applying a rotation equals applying that many quarter turns.
    #[test]
    fn rotation_composes_from_quarter_turns(
        (w, h, offset) in arb_offset_in_footprint(),
        rotation in arb_rotation(),
    ) {
        let direct = rotated_port_offset(offset, w, h, rotation);
        let (mut cw, mut ch) = (w, h);
        let mut p = offset;
        for _ in 0..rotation.quarter_turns() {
            p = rotated_port_offset(p, cw, ch, Rotation::Cw90);
            let (nw, nh) = effective_dimensions(cw, ch, Rotation::Cw90);
            cw = nw;
            ch = nh;
        }
        prop_assert_eq!(direct, p);
    }

    /// Overlap is symmetric.
    #[test]
    fn overlap_symmetry(a in arb_rect(), b in arb_rect()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    /// A rectangle placed flush against any side never overlaps.
    #[test]
    fn touching_never_overlaps(a in arb_rect(), w in 1..8u32, h in 1..8u32) {
        let right = Rect::new(a.x + a.width as i32, a.y, w, h);
        let below = Rect::new(a.x, a.y + a.height as i32, w, h);
        let left = Rect::new(a.x - w as i32, a.y, w, h);
        let above = Rect::new(a.x, a.y - h as i32, w, h);
        for other in [right, below, left, above] {
            prop_assert!(!a.overlaps(&other));
            prop_assert!(!other.overlaps(&a));
            prop_assert_eq!(a.chebyshev_gap(&other), 0);
        }
    }

    /// Chebyshev gap is symmetric and zero exactly when touching or overlapping.
    #[test]
    fn gap_symmetry(a in arb_rect(), b in arb_rect()) {
        prop_assert_eq!(a.chebyshev_gap(&b), b.chebyshev_gap(&a));
        if a.overlaps(&b) {
            prop_assert_eq!(a.chebyshev_gap(&b), 0);
        }
    }
}
