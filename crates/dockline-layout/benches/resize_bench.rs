//! Benchmarks for the resize and redistribution path.
//!
//! Run with: cargo bench -p dockline-layout

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dockline_core::geometry::{Rect, Size};
use dockline_layout::host::{Guest, HostSurface};
use dockline_layout::{LayoutTree, Location};

struct BenchHost {
    bounds: Cell<Size>,
}

impl HostSurface for BenchHost {
    fn bounds(&self) -> Size {
        self.bounds.get()
    }

    fn reparent(&self, _guest: &Rc<dyn Guest>, _new_host: &Rc<dyn HostSurface>) {}

    fn notify_guest_geometry(&self, _guest: &Rc<dyn Guest>, _rect: Rect) {}
}

/// An alternating split tree with `n` leaves.
fn build_tree(n: usize) -> (LayoutTree, Rc<BenchHost>) {
    let host = Rc::new(BenchHost {
        bounds: Cell::new(Size::new(4000, 4000)),
    });
    let mut tree = LayoutTree::new(host.clone());

    let first = tree.create_leaf("leaf-0");
    tree.set_min_size(first, Size::new(100, 100));
    tree.insert_into_root(first, Location::OnLeft);

    let locations = [
        Location::OnRight,
        Location::OnBottom,
        Location::OnLeft,
        Location::OnTop,
    ];
    let mut anchor = first;
    for i in 1..n {
        let leaf = tree.create_leaf(format!("leaf-{i}"));
        tree.set_min_size(leaf, Size::new(100, 100));
        tree.insert_item(leaf, anchor, locations[i % locations.len()]);
        anchor = leaf;
    }
    (tree, host)
}

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/resize");

    for n in [4usize, 8, 12] {
        let (mut tree, host) = build_tree(n);
        group.bench_with_input(BenchmarkId::new("alternating", n), &(), |b, _| {
            let mut grow = true;
            b.iter(|| {
                let size = if grow {
                    Size::new(4400, 4400)
                } else {
                    Size::new(4000, 4000)
                };
                grow = !grow;
                host.bounds.set(size);
                tree.resize(size);
                black_box(tree.geometry(tree.root()));
            });
        });
    }

    group.finish();
}

fn bench_drop_rect(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/suggested_drop_rect");

    let (tree, _host) = build_tree(8);
    let leaves = tree.items_recursive(tree.root());
    group.bench_function("deep_anchor", |b| {
        b.iter(|| {
            for &leaf in &leaves {
                black_box(tree.suggested_drop_rect(
                    Size::new(100, 100),
                    Some(leaf),
                    Location::OnRight,
                ));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resize, bench_drop_rect);
criterion_main!(benches);
