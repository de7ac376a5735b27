//! Background line writer and the concrete sinks.
use std::sync::atomic::AtomicBool;

use crossbeam_channel as xch;
use roaster_core::mocks::{MemorySink, MockRig};
use roaster_core::writer::{FileSink, LineWriter, TeeSink};
use roaster_core::RunLimits;
use roaster_traits::clock::test_clock::TestClock;
use roaster_traits::{BoxError, LineSink};

/// Sink that waits for one gate token per line.
struct GatedSink {
    gate: xch::Receiver<()>,
    inner: MemorySink,
}

impl LineSink for GatedSink {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        self.gate.recv()?;
        self.inner.write_line(line)
    }
}

#[test]
fn writer_drains_queue_on_drop() {
    let sink = MemorySink::default();
    let mut writer = LineWriter::spawn(sink.clone(), 1024);
    for i in 0..100 {
        writer.write_line(&format!("line {i}")).expect("queue");
    }
    assert_eq!(writer.dropped(), 0);
    drop(writer);

    let lines = sink.lines();
    assert_eq!(lines.len(), 100);
    assert_eq!(lines.first().map(String::as_str), Some("line 0"));
    assert_eq!(lines.last().map(String::as_str), Some("line 99"));
}

#[test]
fn full_queue_drops_lines_without_blocking() {
    let (gate_tx, gate_rx) = xch::unbounded();
    let sink = MemorySink::default();
    let mut writer = LineWriter::spawn(
        GatedSink {
            gate: gate_rx,
            inner: sink.clone(),
        },
        2,
    );

    for i in 0..10 {
        writer.write_line(&format!("{i}")).expect("never blocks");
    }
    // Two queued plus at most one held by the blocked thread
    let dropped = writer.dropped();
    assert!(dropped >= 7, "dropped {dropped}");

    for _ in 0..10 {
        gate_tx.send(()).expect("gate");
    }
    drop(writer);
    assert_eq!(sink.lines().len() as u64, 10 - dropped);
}

#[test]
fn roaster_telemetry_through_writer_thread() {
    let rig = MockRig::default();
    let clock = TestClock::new();
    let lines = MemorySink::default();
    let mut roaster = rig
        .builder()
        .with_telemetry(LineWriter::spawn(lines.clone(), 64))
        .with_clock(clock.clone())
        .try_build()
        .expect("build");

    let limits = RunLimits {
        max_ticks: Some(100),
        ..RunLimits::default()
    };
    roaster
        .run(&AtomicBool::new(false), limits)
        .expect("run");
    drop(roaster);

    assert_eq!(lines.lines().len(), 4);
    assert!(rig.telemetry.lines().is_empty());
}

#[test]
fn tee_writes_both_and_reports_failure() {
    let a = MemorySink::default();
    let b = MemorySink::default();
    let mut tee = TeeSink::new(a.clone(), b.clone());
    tee.write_line("x").expect("both ok");

    b.set_failing(true);
    assert!(tee.write_line("y").is_err());
    assert_eq!(a.lines(), vec!["x", "y"]);
    assert_eq!(b.lines(), vec!["x"]);
}

#[test]
fn file_sink_appends_lines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("roast.csv");

    let mut sink = FileSink::create(&path).expect("create");
    sink.write_line("a").expect("write");
    sink.write_line("b").expect("write");
    drop(sink);

    let mut sink = FileSink::create(&path).expect("reopen");
    sink.write_line("c").expect("write");
    drop(sink);

    let text = std::fs::read_to_string(&path).expect("read");
    assert_eq!(text, "a\nb\nc\n");
}
