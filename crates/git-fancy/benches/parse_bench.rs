use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use git_fancy::{FancyLines, OutputStyle, RenderOptions};

/// A log-with-patch stream of `commits` commits, each touching a few files.
fn synthetic_log(commits: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for c in 0..commits {
        lines.push(format!("commit {:040x}", c));
        lines.push("Author: Bench <bench@example.com>".to_string());
        lines.push("Date:   Mon Oct 19 12:00:00 2026".to_string());
        lines.push(String::new());
        lines.push(format!("    change number {}", c));
        lines.push(String::new());
        for f in 0..4 {
            lines.push(format!("diff --git a/src/file{f}.rs b/src/file{f}.rs"));
            lines.push("index 1111111..2222222 100644".to_string());
            lines.push(format!("\x1b[1m--- a/src/file{f}.rs\x1b[m"));
            lines.push(format!("\x1b[1m+++ b/src/file{f}.rs\x1b[m"));
            lines.push("\x1b[36m@@ -10,7 +10,7 @@\x1b[m fn handler()".to_string());
            for i in 0..3 {
                lines.push(format!(" context line {i}"));
            }
            lines.push(format!("\x1b[31m-    let value = compute({c}, {f});\x1b[m"));
            lines.push(format!("\x1b[32m+    let value = compute_fast({c}, {f});\x1b[m"));
            for i in 0..3 {
                lines.push(format!(" trailing line {i}"));
            }
        }
    }
    lines
}

fn render_all(lines: &[String], options: &RenderOptions) -> usize {
    FancyLines::new(lines.iter(), options.clone())
        .map(|line| line.map(|l| l.len()).unwrap_or(0))
        .sum()
}

fn parse_throughput(c: &mut Criterion) {
    let lines = synthetic_log(200);
    let bytes: usize = lines.iter().map(|l| l.len() + 1).sum();

    let mut group = c.benchmark_group("render");
    group.throughput(Throughput::Bytes(bytes as u64));

    let fancy = RenderOptions::default();
    group.bench_function("fancy_200_commits", |b| {
        b.iter(|| render_all(black_box(&lines), &fancy))
    });

    let plain = RenderOptions {
        color: false,
        style: OutputStyle::Plain,
        ..Default::default()
    };
    group.bench_function("plain_200_commits", |b| {
        b.iter(|| render_all(black_box(&lines), &plain))
    });

    group.finish();
}

fn highlight_pairs(c: &mut Criterion) {
    let emphasis = git_fancy::highlight::Emphasis::default();
    let old = b"\x1b[31m-    let value = compute(first_argument, second_argument);\x1b[m";
    let new = b"\x1b[32m+    let value = compute(first_argument, other_argument);\x1b[m";

    c.bench_function("highlight_pair", |b| {
        b.iter(|| git_fancy::highlight::highlight_pair(black_box(old), black_box(new), &emphasis))
    });
}

criterion_group!(benches, parse_throughput, highlight_pairs);
criterion_main!(benches);
