use mpilite::communicator::Communicator;
use mpilite::World;
use mpilite_benchmarks::pingpong::{self, relay, ExchangeOrder, Ring};
use mpilite_benchmarks::{Error, PingPongOptions};
use std::time::Duration;

fn small_opts() -> PingPongOptions {
    PingPongOptions {
        min_size: 1,
        max_size: 64,
        warmup_reps: 3,
        measured_reps: 5,
    }
}

#[test]
fn asymmetric_ring_completes() {
    for size in [2, 3, 5] {
        let records = World::new(size)
            .stall_timeout(Duration::from_secs(10))
            .run(|ctx| {
                let ring = Ring::new(ctx.rank(), ctx.size());
                let order = ExchangeOrder::for_rank(ctx.rank());
                pingpong::trial(&ctx, ring, order, 256, &small_opts())
            })
            .unwrap();
        let record = records[0].unwrap();
        assert_eq!(record.size, 256);
        assert_eq!(record.data_volume_bytes, 256);
        assert!(records[1..].iter().all(Option::is_none));
    }
}

#[test]
fn message_survives_the_round_trip() {
    let messages = World::new(3)
        .run(|ctx| -> mpilite_benchmarks::Result<Vec<u8>> {
            let ring = Ring::new(ctx.rank(), ctx.size());
            let mut message = vec![ctx.rank() as u8; 4];
            relay(&ctx, ring, ExchangeOrder::for_rank(ctx.rank()), &mut message, 1)?;
            Ok(message)
        })
        .unwrap();
    // Rank 0's message travels all the way round; everyone else ends up
    // holding what they received and forwarded.
    assert!(messages.iter().all(|m| m == &vec![0u8; 4]));
}

#[test]
fn symmetric_send_first_deadlocks() {
    for size in [2, 3, 5] {
        let err = World::new(size)
            .stall_timeout(Duration::from_millis(300))
            .run(|ctx| -> mpilite_benchmarks::Result<()> {
                let ring = Ring::new(ctx.rank(), ctx.size());
                let mut message = vec![b'a'; 16];
                relay(&ctx, ring, ExchangeOrder::SendFirst, &mut message, 1)
            })
            .unwrap_err();
        assert!(
            matches!(
                err,
                Error::Comm(mpilite::Error::Stalled { op: "send", .. })
            ),
            "{} ranks: {}",
            size,
            err
        );
    }
}

#[test]
fn sweep_writes_one_row_per_size() {
    let dir = tempfile::tempdir().unwrap();
    let results = World::new(4)
        .run(|ctx| pingpong::run(&ctx, &small_opts(), dir.path()))
        .unwrap();
    let sizes: Vec<usize> = results[0].iter().map(|r| r.size).collect();
    assert_eq!(sizes, vec![1, 2, 4, 8, 16, 32, 64]);

    let csv = std::fs::read_to_string(dir.path().join("pingpong_results.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Message Size (bytes),Latency (us),Bandwidth (MiB/s)");
    assert_eq!(lines.len(), 8);
    assert!(lines[7].starts_with("64,"));
    assert_eq!(lines[7].split(',').count(), 3);
}

#[test]
fn single_participant_is_rejected_before_any_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let err = World::new(1)
        .run(|ctx| pingpong::run(&ctx, &small_opts(), dir.path()))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientParticipants {
            required: 2,
            actual: 1
        }
    ));
    assert!(err.is_precondition());
    assert!(!dir.path().join("pingpong_results.csv").exists());
}
