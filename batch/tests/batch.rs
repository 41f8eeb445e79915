//! Batch-level behavior: per-file isolation, aggregation, cancellation.

use std::path::PathBuf;

use slippi_batch::{scan_replays, BatchRunner};

/// Writes a minimal but complete 2.0.0 replay: two idle players, a handful
/// of frames, a game end, and a metadata element with both connect codes.
fn minimal_replay_bytes() -> Vec<u8> {
    let mut raw: Vec<u8> = Vec::new();

    // Event payloads: game start 418, post-frame 51, game end 2.
    raw.extend([0x35, 10]);
    raw.push(0x36);
    raw.extend(418u16.to_be_bytes());
    raw.push(0x38);
    raw.extend(51u16.to_be_bytes());
    raw.push(0x39);
    raw.extend(2u16.to_be_bytes());

    // Game start: version 2.0.0, stage and two human players, rest zeroed.
    let mut start = vec![0u8; 418];
    start[0] = 2; // major
    start[18..20].copy_from_slice(&31u16.to_be_bytes()); // Battlefield
    for (slot, character) in [(0usize, 2u8), (1, 20)] {
        let base = 100 + slot * 36;
        start[base] = character;
        start[base + 1] = 0; // human
        start[base + 2] = 4; // stocks
    }
    start[100 + 2 * 36 + 1] = 3; // port 3 empty
    start[100 + 3 * 36 + 1] = 3; // port 4 empty
    raw.push(0x36);
    raw.extend(&start);

    for frame in -123i32..-118 {
        for port in [0u8, 1] {
            let mut post = vec![0u8; 51];
            post[..4].copy_from_slice(&frame.to_be_bytes());
            post[4] = port;
            post[6] = 2; // character
            post[7..9].copy_from_slice(&14u16.to_be_bytes()); // standing
            post[31] = 255; // last hit by: nobody
            post[32] = 4; // stocks
            raw.push(0x38);
            raw.extend(&post);
        }
    }

    raw.extend([0x39, 2, 255]);

    let mut bytes = Vec::new();
    bytes.extend(b"{U\x03raw[$U#l");
    bytes.extend((raw.len() as i32).to_be_bytes());
    bytes.extend(raw);

    bytes.extend(b"U\x08metadata{");
    bytes.extend(b"U\x07startAtSU\x142020-06-01T12:00:00Z");
    bytes.extend(b"U\x07players{");
    bytes.extend(b"U\x010{U\x05names{U\x04codeSU\x08MANG#100U\x07netplaySU\x05mango}}");
    bytes.extend(b"U\x011{U\x05names{U\x04codeSU\x08ARMA#200U\x07netplaySU\x04arma}}");
    bytes.extend(b"}}");
    bytes.push(b'}');

    bytes
}

#[test]
fn corrupt_files_never_halt_the_batch() {
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("good.slp");
    std::fs::write(&good, minimal_replay_bytes()).unwrap();

    let bad = dir.path().join("bad.slp");
    let mut corrupt = minimal_replay_bytes();
    corrupt.truncate(corrupt.len() / 2);
    std::fs::write(&bad, corrupt).unwrap();

    let report = BatchRunner::new(2).run(vec![good, bad.clone()]);

    assert_eq!(report.files_processed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, bad);
    assert_eq!(report.files_skipped, 0);
    // Idle players produce no rows, but the file still counted as processed.
    assert!(report.techs.is_empty());
}

#[test]
fn scan_picks_up_only_slp_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.slp"), b"x").unwrap();
    std::fs::write(dir.path().join("a.slp"), b"x").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

    let paths = scan_replays(dir.path()).unwrap();
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.slp", "b.slp"]);
}

#[test]
fn cancelled_runner_leaves_the_queue_untouched() {
    let runner = BatchRunner::new(1);
    runner.cancel_token().cancel();

    let paths: Vec<PathBuf> = (0..4).map(|i| PathBuf::from(format!("/nope/{i}.slp"))).collect();
    let report = runner.run(paths);

    assert_eq!(report.files_processed, 0);
    assert_eq!(report.failures.len(), 0);
    assert_eq!(report.files_skipped, 4);
}
