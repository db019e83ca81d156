//! Log panel drawing and surface present benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use setup_tui::log::{LogLevel, LogPanel};
use setup_tui::panel::Panel;
use setup_tui::{Style, UiContext};
use std::hint::black_box;

fn filled_log(ctx: &UiContext, entries: usize) -> LogPanel {
    let mut log = LogPanel::new(ctx.clone(), 0, LogLevel::Debug, 300);
    log.set_visible(true);
    for i in 0..entries {
        match i % 3 {
            0 => log.error(&format!("step {i} failed: 'make install' returned 2")),
            1 => log.info(&format!("step {i}: downloading openssl-1.0.0d.tar.gz into the cache")),
            _ => log.debug(&format!("step {i}: executing command with a long argument list that wraps")),
        }
    }
    log
}

fn log_forced_redraw(c: &mut Criterion) {
    let ctx = UiContext::headless(80, 24);
    let mut log = filled_log(&ctx, 300);

    c.bench_function("log_forced_redraw_80x24", |b| {
        b.iter(|| log.redraw(black_box(true), true).unwrap());
    });

    let ctx_large = UiContext::headless(200, 50);
    let mut log_large = filled_log(&ctx_large, 300);

    c.bench_function("log_forced_redraw_200x50", |b| {
        b.iter(|| log_large.redraw(black_box(true), true).unwrap());
    });
}

fn log_append_and_redraw(c: &mut Criterion) {
    let ctx = UiContext::headless(80, 24);

    c.bench_function("log_append_then_redraw", |b| {
        b.iter_batched(
            || filled_log(&ctx, 100),
            |mut log| {
                log.info(black_box("one more entry"));
                log.redraw(true, true).unwrap();
                log
            },
            BatchSize::SmallInput,
        );
    });
}

fn log_level_switch(c: &mut Criterion) {
    let ctx = UiContext::headless(80, 24);

    c.bench_function("log_level_repopulate_300", |b| {
        b.iter_batched(
            || filled_log(&ctx, 300),
            |mut log| {
                log.set_level(LogLevel::Error).unwrap();
                log
            },
            BatchSize::SmallInput,
        );
    });
}

fn surface_present(c: &mut Criterion) {
    let ctx = UiContext::headless(80, 24);

    c.bench_function("present_one_changed_row", |b| {
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let mut surface = ctx.lock();
            let text = if toggle { "downloading" } else { "building" };
            surface.buffer_mut().draw_text(0, 12, black_box(text), Style::NONE);
            surface.present().unwrap();
        });
    });
}

criterion_group!(
    benches,
    log_forced_redraw,
    log_append_and_redraw,
    log_level_switch,
    surface_present,
);
criterion_main!(benches);
