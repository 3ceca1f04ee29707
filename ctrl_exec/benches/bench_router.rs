//! # Router Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ctrl_lib::router::{Node, Obstacle, Router, RouterParams};

fn router_benchmark(c: &mut Criterion) {
    let router = Router::new(RouterParams::default());

    // Room with a table in the middle and a box to one side
    let table = Obstacle::new(0.0, 0.0, 90.0, 60.0);
    let trash_box = Obstacle::new(-150.0, 40.0, 20.0, 40.5);
    let room = [table, trash_box];

    // Start in the bottom left, goal on the far side of the table
    let start = Node::new(-120.0, -100.0);
    let goal = Node::new(20.0, 48.0);

    c.bench_function("calc_route", |b| {
        b.iter(|| {
            router
                .calc_route(black_box(&start), black_box(&goal), &table)
                .unwrap()
        })
    });

    c.bench_function("calc_full_route", |b| {
        b.iter(|| {
            router
                .calc_full_route(black_box(&start), black_box(&goal), &room)
                .unwrap()
        })
    });

    c.bench_function("grab_position", |b| {
        b.iter(|| router.grab_position(black_box(&Node::new(10.0, 25.0)), &table))
    });
}

criterion_group!(benches, router_benchmark);
criterion_main!(benches);
