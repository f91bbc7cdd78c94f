//! Criterion benchmarks for belt routing and placement checks.

use std::collections::BTreeSet;

use criterion::{Criterion, criterion_group, criterion_main};
use planner_core::config::GridConfig;
use planner_core::geometry::{Direction, GridPosition, Rotation};
use planner_core::layout::Layout;
use planner_core::test_utils::*;
use planner_spatial::{RouteRequest, is_placement_valid, route_all, route_belt};

/// Vertical walls with alternating gaps, forcing a serpentine route.
fn serpentine_obstacles(width: i32, height: i32) -> BTreeSet<GridPosition> {
    let mut cells = BTreeSet::new();
    for (i, x) in (4..width - 4).step_by(4).enumerate() {
        let gap = if i % 2 == 0 { height - 2 } else { 1 };
        for y in 0..height {
            if y != gap {
                cells.insert(GridPosition::new(x, y));
            }
        }
    }
    cells
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");
    group.sample_size(50);

    let config = GridConfig::with_size(64, 64, 4);
    let ignore = BTreeSet::new();

    group.bench_function("direct_64", |b| {
        let request = RouteRequest {
            start: GridPosition::new(0, 0),
            start_facing: Direction::East,
            end: GridPosition::new(63, 63),
            end_facing: Direction::North,
            obstacles: None,
            ignore: &ignore,
        };
        b.iter(|| route_belt(&request, &config));
    });

    let walls = serpentine_obstacles(64, 64);
    group.bench_function("serpentine_64", |b| {
        let request = RouteRequest {
            start: GridPosition::new(0, 32),
            start_facing: Direction::East,
            end: GridPosition::new(63, 32),
            end_facing: Direction::West,
            obstacles: Some(&walls),
            ignore: &ignore,
        };
        b.iter(|| route_belt(&request, &config));
    });

    group.bench_function("route_all_chain_20", |b| {
        let catalog = sample_catalog();
        let mut layout = Layout::new();
        let mut prev = place(&mut layout, miner(), 0, 0);
        for i in 1..20 {
            let next = place(&mut layout, assembler(), (i % 5) * 8, (i / 5) * 6 + 30);
            // Miner output is port 0, assembler output is port 2.
            let out_port = if i == 1 { 0 } else { 2 };
            connect(&mut layout, prev, out_port, next, 0);
            prev = next;
        }
        b.iter(|| route_all(&catalog, &layout, &config));
    });

    group.finish();
}

fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");
    group.sample_size(50);

    let catalog = sample_catalog();
    let config = GridConfig::with_size(64, 64, 4);
    let mut layout = Layout::new();
    for y in 0..10 {
        for x in 0..10 {
            place(&mut layout, relay(), x * 2, y * 2);
        }
    }

    group.bench_function("check_100_items", |b| {
        b.iter(|| {
            is_placement_valid(
                &catalog,
                &layout,
                &config,
                assembler(),
                GridPosition::new(40, 40),
                Rotation::Cw90,
                None,
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_routing, bench_placement);
criterion_main!(benches);
