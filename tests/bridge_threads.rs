//! Worker threads feeding panels through Async Bridges.
//!
//! Workers only ever hold senders. Nothing reaches a panel until the
//! render side flushes.

use setup_tui::controller::Controller;
use setup_tui::log::{LogLevel, LogPanel};
use setup_tui::panel::{Extent, OutputPanel, Panel, PanelHandle, share};
use setup_tui::worker::{ChainOutcome, OutputSink, Step, StepChain, StepContext, WorkerControl, WorkerThread};
use setup_tui::UiContext;
use std::sync::Arc;
use std::thread;

const PRODUCERS: usize = 4;
const PER_PRODUCER: usize = 50;

// ============================================================================
// Log senders
// ============================================================================

#[test]
fn test_many_log_producers_keep_their_order() {
    eprintln!("[TEST] {PRODUCERS} threads log {PER_PRODUCER} entries each");
    let mut log = LogPanel::new(UiContext::headless(60, 10), 0, LogLevel::Debug, 1000);
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let sender = log.sender();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    sender.info(&format!("{producer}:{i}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(log.backlog().count(), 0, "nothing arrives before a flush");
    assert_eq!(log.flush_inbound(), PRODUCERS * PER_PRODUCER);
    assert_eq!(log.flush_inbound(), 0);

    eprintln!("[TEST] Per-thread order survives the hand-off");
    for producer in 0..PRODUCERS {
        let prefix = format!("{producer}:");
        let seen: Vec<usize> = log
            .backlog()
            .filter_map(|e| e.message().strip_prefix(&prefix)?.parse().ok())
            .collect();
        assert_eq!(seen, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
}

#[test]
fn test_sender_outliving_panel_drops_messages() {
    eprintln!("[TEST] Sending after the panel is gone is harmless");
    let panel = OutputPanel::new(UiContext::headless(40, 5), "Output", 0, 0);
    let sender = panel.sender();
    drop(panel);
    assert!(!sender.put("late".to_string()));
}

// ============================================================================
// Step chains on worker threads
// ============================================================================

#[test]
fn test_worker_output_reaches_panels_after_flush() {
    eprintln!("[TEST] A chain on a worker thread reports through both bridges");
    let ctx = UiContext::headless(60, 20);
    let log = share(LogPanel::new(ctx.clone(), 0, LogLevel::Info, 100));
    let output = share(OutputPanel::new(ctx.clone(), "Output", 0, 0));
    output.lock().unwrap().base_mut().set_height(Extent::Fixed(8));
    let log_sender = log.lock().unwrap().sender();
    let out_sender = output.lock().unwrap().sender();

    let mut ctl = Controller::new(ctx.clone());
    ctl.add_page(vec![Arc::clone(&output) as PanelHandle, Arc::clone(&log) as PanelHandle]);

    let chain = StepChain::new("Demo")
        .with(Step::new("greet", |ctx| {
            ctx.output.line("hello from the worker");
            Ok(())
        }))
        .with(Step::new("count", |ctx| {
            for i in 0..3 {
                ctx.output.line(&format!("line {i}"));
            }
            Ok(())
        }));

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    let mut worker = WorkerThread::spawn("demo", WorkerControl::new(), move |control| {
        let outcome = chain.run(&StepContext {
            log: &log_sender,
            output: &out_sender,
            control: &control,
        });
        let _ = done_tx.send(outcome);
    })
    .unwrap();
    assert_eq!(done_rx.recv().unwrap(), ChainOutcome::Completed);
    worker.stop().unwrap();

    assert_eq!(output.lock().unwrap().lines().count(), 0);
    assert!(ctl.flush_bridges() > 0);

    let lines: Vec<String> = output.lock().unwrap().lines().map(str::to_string).collect();
    assert_eq!(lines, ["hello from the worker", "line 0", "line 1", "line 2"]);
    let messages: Vec<String> = log.lock().unwrap().entries().map(|e| e.message().to_string()).collect();
    assert_eq!(messages, ["Demo complete", "Starting Demo"]);

    eprintln!("[TEST] Flushed output is drawn on the next redraw");
    ctl.redraw(true).unwrap();
    let text: Vec<String> = {
        let surface = ctx.lock();
        (0..20).map(|y| surface.buffer().row_text(y)).collect()
    };
    assert!(text.iter().any(|row| row.contains("hello from the worker")));
    assert!(text.iter().any(|row| row.contains("Demo complete")));
}

#[test]
fn test_stopping_worker_ends_chain_early() {
    eprintln!("[TEST] A stopped worker skips the remaining steps");
    let log = LogPanel::new(UiContext::headless(40, 10), 0, LogLevel::Info, 100);
    let log_sender = log.sender();
    let output = OutputPanel::new(UiContext::headless(40, 10), "Output", 0, 0);
    let out_sender = output.sender();

    let (started_tx, started_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let (done_tx, done_rx) = std::sync::mpsc::channel();
    let chain = StepChain::new("Slow")
        .with(Step::new("wait", move |_| {
            let _ = started_tx.send(());
            let _ = release_rx.recv();
            Ok(())
        }))
        .with(Step::new("never", |ctx| {
            ctx.output.line("should not run");
            Ok(())
        }));

    let control = WorkerControl::new();
    let mut worker = WorkerThread::spawn("slow", control.clone(), move |control| {
        let outcome = chain.run(&StepContext {
            log: &log_sender,
            output: &out_sender,
            control: &control,
        });
        let _ = done_tx.send(outcome);
    })
    .unwrap();

    started_rx.recv().unwrap();
    control.stop();
    release_tx.send(()).unwrap();
    assert_eq!(done_rx.recv().unwrap(), ChainOutcome::Stopped);
    worker.stop().unwrap();
    assert!(!worker.is_running());
}
