//! Tests for LogFile
//!
//! These tests verify:
//! - Write/read/delete against a single file
//! - Offsets and file size bookkeeping
//! - Replay on open (index rebuilt exactly, mixed record versions)
//! - Fatal replay errors (unknown version, unknown type, truncated tail)
//! - Concurrent readers and writers

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use kave::config::SyncStrategy;
use kave::logfile::{LogFile, Lookup};
use kave::record::{encode_tombstone, encode_write};
use kave::KaveError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("00000000000000000001.gkv");
    (temp_dir, path)
}

fn open(path: &Path) -> LogFile {
    LogFile::open(path, SyncStrategy::EveryWrite).unwrap()
}

fn append_raw(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

fn found(value: &[u8]) -> Lookup {
    Lookup::Found(Bytes::copy_from_slice(value))
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, path) = setup_temp_log();
    assert!(!path.exists());

    let log = open(&path);

    assert!(path.exists());
    assert_eq!(log.size().unwrap(), 0);
    assert_eq!(log.key_count(), 0);
    assert_eq!(log.replay_stats().records, 0);
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    log.write(b"hello", b"world").unwrap();

    assert_eq!(log.read(b"hello").unwrap(), found(b"world"));
}

#[test]
fn test_read_missing_key() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    assert_eq!(log.read(b"nope").unwrap(), Lookup::NotPresent);
}

#[test]
fn test_write_returns_offsets() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    let first = log.write(b"alice", b"30").unwrap();
    let second = log.write(b"bob", b"25").unwrap();
    let third = log.delete(b"alice").unwrap();

    assert_eq!(first, 0);
    assert_eq!(second, 14); // 7 + 5 + 2
    assert_eq!(third, 26); // + 7 + 3 + 2
    assert_eq!(log.size().unwrap(), 38); // + 7 + 5
}

#[test]
fn test_alice_bob_carol_scenario() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    log.write(b"alice", b"30").unwrap();
    log.write(b"bob", b"25").unwrap();
    log.delete(b"alice").unwrap();

    assert_eq!(log.read(b"alice").unwrap(), Lookup::Deleted);
    assert_eq!(log.read(b"bob").unwrap(), found(b"25"));
    assert_eq!(log.read(b"carol").unwrap(), Lookup::NotPresent);
}

#[test]
fn test_overwrite_returns_latest() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    log.write(b"key", b"v1").unwrap();
    log.write(b"key", b"v2").unwrap();
    log.write(b"key", b"version three").unwrap();

    assert_eq!(log.read(b"key").unwrap(), found(b"version three"));
    assert_eq!(log.key_count(), 1);
}

#[test]
fn test_delete_shadows_write() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    log.write(b"key", b"value").unwrap();
    log.delete(b"key").unwrap();

    let lookup = log.read(b"key").unwrap();
    assert_eq!(lookup, Lookup::Deleted);
    assert_eq!(lookup.into_value(), None);
    // Tombstoned keys stay in the index
    assert_eq!(log.key_count(), 1);
}

#[test]
fn test_write_after_delete() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    log.write(b"key", b"old").unwrap();
    log.delete(b"key").unwrap();
    log.write(b"key", b"new").unwrap();

    assert_eq!(log.read(b"key").unwrap(), found(b"new"));
}

#[test]
fn test_delete_missing_key_appends_tombstone() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    let offset = log.delete(b"ghost").unwrap();

    assert_eq!(offset, 0);
    assert_eq!(log.size().unwrap(), 12); // 7 + 5
    assert_eq!(log.read(b"ghost").unwrap(), Lookup::Deleted);
}

#[test]
fn test_empty_key_and_value() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    log.write(b"", b"empty key").unwrap();
    log.write(b"empty value", b"").unwrap();

    assert_eq!(log.read(b"").unwrap(), found(b"empty key"));
    assert_eq!(log.read(b"empty value").unwrap(), found(b""));
}

#[test]
fn test_binary_data() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    let key = [0u8, 255, 1, 254];
    let value: Vec<u8> = (0..=255u8).collect();
    log.write(&key, &value).unwrap();

    assert_eq!(log.read(&key).unwrap(), found(&value));
}

#[test]
fn test_large_value() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    let value = vec![0xAB; 1024 * 1024];
    log.write(b"big", &value).unwrap();

    assert_eq!(log.read(b"big").unwrap(), found(&value));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_key_too_long_touches_nothing() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);
    log.write(b"existing", b"value").unwrap();
    let size_before = log.size().unwrap();
    let index_before = log.index_snapshot();

    let long_key = vec![b'x'; 256];
    assert!(matches!(
        log.write(&long_key, b"v"),
        Err(KaveError::KeyTooLong { len: 256, .. })
    ));
    assert!(matches!(
        log.delete(&long_key),
        Err(KaveError::KeyTooLong { .. })
    ));

    assert_eq!(log.size().unwrap(), size_before);
    assert_eq!(log.index_snapshot(), index_before);
}

#[test]
fn test_key_at_max_length() {
    let (_temp, path) = setup_temp_log();
    let log = open(&path);

    let key = vec![b'k'; 255];
    log.write(&key, b"value").unwrap();

    assert_eq!(log.read(&key).unwrap(), found(b"value"));
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_reopen_recovers_values() {
    let (_temp, path) = setup_temp_log();

    {
        let log = open(&path);
        log.write(b"alice", b"30").unwrap();
        log.write(b"bob", b"25").unwrap();
        log.delete(b"alice").unwrap();
    }

    let log = open(&path);
    assert_eq!(log.read(b"alice").unwrap(), Lookup::Deleted);
    assert_eq!(log.read(b"bob").unwrap(), found(b"25"));
    assert_eq!(log.read(b"carol").unwrap(), Lookup::NotPresent);

    let stats = log.replay_stats();
    assert_eq!(stats.records, 3);
    assert_eq!(stats.written, 2);
    assert_eq!(stats.tombstones, 1);
    assert_eq!(stats.bytes, 38);
}

#[test]
fn test_reopen_rebuilds_identical_index() {
    let (_temp, path) = setup_temp_log();

    let before = {
        let log = open(&path);
        for i in 0..50 {
            let key = format!("key{}", i % 7);
            if i % 5 == 0 {
                log.delete(key.as_bytes()).unwrap();
            } else {
                log.write(key.as_bytes(), format!("value{}", i).as_bytes()).unwrap();
            }
        }
        log.delete(b"never-written").unwrap();
        log.index_snapshot()
    };

    let log = open(&path);
    assert_eq!(log.index_snapshot(), before);
}

#[test]
fn test_reopen_then_append() {
    let (_temp, path) = setup_temp_log();

    {
        let log = open(&path);
        log.write(b"a", b"1").unwrap();
    }

    let log = open(&path);
    let offset = log.write(b"b", b"2").unwrap();

    assert_eq!(offset, 9); // 7 + 1 + 1
    assert_eq!(log.read(b"a").unwrap(), found(b"1"));
    assert_eq!(log.read(b"b").unwrap(), found(b"2"));
}

#[test]
fn test_replay_version_one_records() {
    let (_temp, path) = setup_temp_log();

    // [vsn=1][key_len=3][value_len=2 LE] "old" "v1"
    append_raw(&path, &[1, 3, 2, 0, 0, 0, b'o', b'l', b'd', b'v', b'1']);

    let log = open(&path);
    assert_eq!(log.read(b"old").unwrap(), found(b"v1"));
    assert_eq!(log.replay_stats().legacy_records, 1);

    // New records are appended in the current format after the legacy one
    let offset = log.write(b"new", b"v2").unwrap();
    assert_eq!(offset, 11);
    assert_eq!(log.read(b"new").unwrap(), found(b"v2"));
}

#[test]
fn test_replay_mixed_versions_with_tombstone() {
    let (_temp, path) = setup_temp_log();

    append_raw(&path, &[1, 1, 3, 0, 0, 0, b'k', b'o', b'l', b'd']);
    append_raw(&path, &encode_tombstone(b"k").unwrap());
    append_raw(&path, &[1, 1, 1, 0, 0, 0, b'j', b'x']);

    let log = open(&path);
    assert_eq!(log.read(b"k").unwrap(), Lookup::Deleted);
    assert_eq!(log.read(b"j").unwrap(), found(b"x"));

    let stats = log.replay_stats();
    assert_eq!(stats.records, 3);
    assert_eq!(stats.legacy_records, 2);
    assert_eq!(stats.tombstones, 1);
}

#[test]
fn test_replay_unrecognised_version_fails() {
    let (_temp, path) = setup_temp_log();

    append_raw(&path, &encode_write(b"good", b"record").unwrap());
    append_raw(&path, &[9, 0, 0, 0, 0, 0, 0]);

    let result = LogFile::open(&path, SyncStrategy::EveryWrite);
    assert!(matches!(result, Err(KaveError::UnrecognisedVersion(9))));
}

#[test]
fn test_replay_unrecognised_entry_type_fails() {
    let (_temp, path) = setup_temp_log();

    append_raw(&path, &[2, 1, 1, 0, 0, 0, 5, b'k', b'v']);

    let result = LogFile::open(&path, SyncStrategy::EveryWrite);
    assert!(matches!(result, Err(KaveError::UnrecognisedEntryType(5))));
}

#[test]
fn test_replay_truncated_header_fails() {
    let (_temp, path) = setup_temp_log();

    append_raw(&path, &encode_write(b"alice", b"30").unwrap());
    append_raw(&path, &[2, 5]);

    let result = LogFile::open(&path, SyncStrategy::EveryWrite);
    assert!(matches!(
        result,
        Err(KaveError::TruncatedRecord {
            offset: 14,
            expected: 7,
            available: 2
        })
    ));
}

#[test]
fn test_replay_truncated_value_fails() {
    let (_temp, path) = setup_temp_log();

    // Header promises a 10-byte value, only 3 bytes follow the key
    append_raw(&path, &[2, 1, 10, 0, 0, 0, 0, b'k', b'a', b'b', b'c']);

    let result = LogFile::open(&path, SyncStrategy::EveryWrite);
    assert!(matches!(
        result,
        Err(KaveError::TruncatedRecord {
            offset: 0,
            expected: 18,
            available: 11
        })
    ));
}

#[test]
fn test_verify_reports_stats() {
    let (_temp, path) = setup_temp_log();
    {
        let log = open(&path);
        log.write(b"a", b"1").unwrap();
        log.write(b"b", b"2").unwrap();
        log.delete(b"a").unwrap();
    }

    let stats = LogFile::verify(&path).unwrap();

    assert_eq!(stats.records, 3);
    assert_eq!(stats.written, 2);
    assert_eq!(stats.tombstones, 1);
    assert_eq!(stats.bytes, fs::metadata(&path).unwrap().len());
}

#[test]
fn test_verify_missing_file_fails() {
    let (_temp, path) = setup_temp_log();

    assert!(matches!(LogFile::verify(&path), Err(KaveError::Io(_))));
    assert!(!path.exists());
}

#[test]
fn test_os_buffered_strategy_round_trip() {
    let (_temp, path) = setup_temp_log();

    {
        let log = LogFile::open(&path, SyncStrategy::OsBuffered).unwrap();
        log.write(b"key", b"value").unwrap();
        log.sync().unwrap();
    }

    assert_eq!(open(&path).read(b"key").unwrap(), found(b"value"));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_distinct_keys() {
    let (_temp, path) = setup_temp_log();
    let log = Arc::new(LogFile::open(&path, SyncStrategy::OsBuffered).unwrap());

    let mut handles = Vec::new();
    for t in 0..4 {
        let log = Arc::clone(&log);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let key = format!("thread{}_key{}", t, i);
                let value = format!("thread{}_value{}", t, i);
                log.write(key.as_bytes(), value.as_bytes()).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..4 {
        for i in 0..100 {
            let key = format!("thread{}_key{}", t, i);
            let expected = format!("thread{}_value{}", t, i);
            assert_eq!(log.read(key.as_bytes()).unwrap(), found(expected.as_bytes()));
        }
    }
    assert_eq!(log.key_count(), 400);
}

#[test]
fn test_concurrent_writers_same_key_match_replay() {
    let (_temp, path) = setup_temp_log();
    let log = Arc::new(LogFile::open(&path, SyncStrategy::OsBuffered).unwrap());

    let mut handles = Vec::new();
    for t in 0..8 {
        let log = Arc::clone(&log);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                if i % 10 == 9 {
                    log.delete(b"shared").unwrap();
                } else {
                    log.write(b"shared", format!("{}-{}", t, i).as_bytes()).unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let live_index = log.index_snapshot();
    let live_read = log.read(b"shared").unwrap();
    drop(log);

    let reopened = open(&path);
    assert_eq!(reopened.index_snapshot(), live_index);
    assert_eq!(reopened.read(b"shared").unwrap(), live_read);
}

#[test]
fn test_concurrent_readers_during_writes() {
    let (_temp, path) = setup_temp_log();
    let log = Arc::new(LogFile::open(&path, SyncStrategy::OsBuffered).unwrap());

    for i in 0..100 {
        log.write(format!("stable{}", i).as_bytes(), b"fixed").unwrap();
    }

    let writer = {
        let log = Arc::clone(&log);
        thread::spawn(move || {
            for i in 0..500 {
                log.write(b"hot", format!("value{:04}", i).as_bytes()).unwrap();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let log = Arc::clone(&log);
        readers.push(thread::spawn(move || {
            for i in 0..500 {
                let key = format!("stable{}", i % 100);
                assert_eq!(log.read(key.as_bytes()).unwrap(), found(b"fixed"));

                // Either not yet written or a complete value, never torn
                match log.read(b"hot").unwrap() {
                    Lookup::NotPresent => {}
                    Lookup::Found(value) => {
                        assert_eq!(value.len(), 9);
                        assert!(value.starts_with(b"value"));
                    }
                    Lookup::Deleted => panic!("hot was never deleted"),
                }
            }
        }));
    }

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(log.read(b"hot").unwrap(), found(b"value0499"));
}
