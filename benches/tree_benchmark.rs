//! Tree benchmark: rendering and cursor-to-node lookup on large forests.
//!
//! Target: < 1ms to render 10k nodes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use treeline::widget::{render_lines, selected_path};
use treeline::Node;

struct Group {
    title: String,
    children: Vec<Group>,
}

impl Node for Group {
    fn title(&self) -> &str {
        &self.title
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.children.iter().map(|child| child as &dyn Node).collect()
    }
}

/// A forest `fanout` wide at every level, `depth` levels deep.
fn forest(fanout: usize, depth: usize) -> Vec<Group> {
    fn build(name: &str, fanout: usize, depth: usize) -> Group {
        let children = if depth == 0 {
            Vec::new()
        } else {
            (0..fanout)
                .map(|i| build(&format!("{name}.{i}"), fanout, depth - 1))
                .collect()
        };
        Group {
            title: name.to_string(),
            children,
        }
    }
    (0..fanout)
        .map(|i| build(&format!("group{i}"), fanout, depth))
        .collect()
}

fn render_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_lines");

    for (fanout, depth) in [(10, 1), (10, 2), (10, 3)] {
        let roots = forest(fanout, depth);
        let nodes: Vec<&dyn Node> = roots.iter().map(|root| root as &dyn Node).collect();

        group.bench_with_input(
            BenchmarkId::new("fanout_depth", format!("{fanout}x{depth}")),
            &nodes,
            |b, nodes| b.iter(|| render_lines(black_box(nodes))),
        );
    }

    group.finish();
}

fn lookup_last_row(c: &mut Criterion) {
    let roots = forest(10, 3);
    let nodes: Vec<&dyn Node> = roots.iter().map(|root| root as &dyn Node).collect();
    let last = render_lines(&nodes).len() - 1;

    c.bench_function("selected_path_last_of_11k", |b| {
        b.iter(|| selected_path(black_box(&nodes), black_box(last)));
    });
}

criterion_group!(benches, render_forest, lookup_last_row);
criterion_main!(benches);
