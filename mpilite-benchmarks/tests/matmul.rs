use approx::assert_relative_eq;
use mpilite::communicator::Communicator;
use mpilite::World;
use mpilite_benchmarks::matmul::{self, fill_multiplicand, fill_source};
use mpilite_benchmarks::{Error, MatMulOptions, RowPartition};

/// Plain triple loop over the whole matrix, no partitioning.
fn naive_product(a: &[f32], b: &[f32], n: usize) -> Vec<f32> {
    let mut c = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                c[i * n + j] += a[i * n + k] * b[k * n + j];
            }
        }
    }
    c
}

fn gathered_product(n: usize, participants: usize) -> Vec<f32> {
    let mut trials = World::new(participants)
        .run(|ctx| matmul::trial(&ctx, n))
        .unwrap();
    for trial in &trials[1..] {
        assert!(trial.record.is_none());
        assert!(trial.product.is_none());
    }
    trials.swap_remove(0).product.unwrap()
}

#[test]
fn gathered_product_matches_reference() {
    for n in [2, 4, 8] {
        let expected = naive_product(&fill_source(n), &fill_multiplicand(n), n);
        for participants in 1..=3 {
            let product = gathered_product(n, participants);
            assert_eq!(product.len(), n * n);
            for (got, want) in product.iter().zip(&expected) {
                assert_relative_eq!(*got, *want);
            }
        }
    }
}

#[test]
fn four_ranks_size_eight() {
    let partition = RowPartition::new(8, 8, 4);
    assert_eq!(partition.row_counts(), &[2, 2, 2, 2]);

    let product = gathered_product(8, 4);
    let a = fill_source(8);
    let b = fill_multiplicand(8);
    for i in 0..8 {
        for j in 0..8 {
            let want: f32 = (0..8).map(|k| a[i * 8 + k] * b[k * 8 + j]).sum();
            assert_relative_eq!(product[i * 8 + j], want);
        }
    }
}

#[test]
fn more_ranks_than_rows() {
    let expected = naive_product(&fill_source(2), &fill_multiplicand(2), 2);
    assert_eq!(gathered_product(2, 5), expected);
}

#[test]
fn coordinator_record_uses_own_share() {
    let trials = World::new(3)
        .run(|ctx| matmul::trial(&ctx, 4))
        .unwrap();
    let record = trials[0].record.unwrap();
    assert_eq!(record.size, 4);
    // Two scattered rows, the full multiplicand and two gathered rows.
    assert_eq!(record.data_volume_bytes, 2 * 16 + 64 + 2 * 16);
    assert!(record.latency_us >= 0.0);
}

#[test]
fn sweep_writes_one_row_per_size() {
    let dir = tempfile::tempdir().unwrap();
    let opts = MatMulOptions {
        min_size: 2,
        max_size: 16,
    };
    let results = World::new(3)
        .run(|ctx| matmul::run(&ctx, &opts, dir.path()))
        .unwrap();
    let sizes: Vec<usize> = results[0].iter().map(|r| r.size).collect();
    assert_eq!(sizes, vec![2, 4, 8, 16]);
    assert!(results[1].is_empty() && results[2].is_empty());

    let csv = std::fs::read_to_string(dir.path().join("mat_mat_results.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Matrix Size (nxn),Data Size (bytes),Latency (us),Bandwidth (MiB/s)"
    );
    assert_eq!(lines.len(), 5);
    // n = 2 over 3 ranks: the coordinator owns one row of 2 floats.
    assert!(lines[1].starts_with("2,32,"), "{}", lines[1]);
}

#[test]
fn empty_sweep_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let opts = MatMulOptions {
        min_size: 64,
        max_size: 8,
    };
    let results = World::new(2)
        .run(|ctx| matmul::run(&ctx, &opts, dir.path()))
        .unwrap();
    assert!(results[0].is_empty());
    let csv = std::fs::read_to_string(dir.path().join("mat_mat_results.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[test]
fn unopenable_results_file_aborts_every_rank() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let err = World::new(3)
        .run(|ctx| {
            let out = matmul::run(&ctx, &MatMulOptions::default(), &missing);
            if ctx.rank() != 0 {
                // Released from the first barrier instead of hanging.
                assert!(matches!(out, Err(Error::Comm(mpilite::Error::Aborted { .. }))));
            }
            out
        })
        .unwrap_err();
    assert!(matches!(err, Error::Sink { .. }));
    // Only the coordinator saw this one; the job has to be torn down.
    assert!(!err.is_precondition());
}
