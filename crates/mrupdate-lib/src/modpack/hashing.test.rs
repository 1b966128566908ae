use super::*;
use tempfile::TempDir;

const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

#[test]
fn test_sha1_hex_known_value() {
    assert_eq!(sha1_hex(b"hello"), HELLO_SHA1);
}

#[test]
fn test_sha1_file_matches_in_memory_digest() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mod.jar");
    std::fs::write(&path, b"hello").unwrap();

    assert_eq!(sha1_file(&path).unwrap(), HELLO_SHA1);
}

#[test]
fn test_sha1_file_missing_is_error() {
    let temp = TempDir::new().unwrap();
    assert!(sha1_file(&temp.path().join("absent.jar")).is_err());
}

#[test]
fn test_streaming_hasher_accepts_chunked_input() {
    let mut hasher = StreamingHasher::new();
    hasher.update(b"hel");
    hasher.update(b"lo");

    let expected = FileHashes {
        sha1: HELLO_SHA1.to_uppercase(),
        sha512: None,
    };
    assert!(hasher.verify("https://cdn.test/a.jar", &expected).is_ok());
}

#[test]
fn test_streaming_hasher_rejects_sha1_mismatch() {
    let mut hasher = StreamingHasher::new();
    hasher.update(b"tampered");

    let expected = FileHashes {
        sha1: HELLO_SHA1.to_string(),
        sha512: None,
    };
    assert!(matches!(
        hasher.verify("https://cdn.test/a.jar", &expected),
        Err(ModrinthError::HashMismatch { .. })
    ));
}

#[test]
fn test_streaming_hasher_checks_sha512_when_present() {
    let mut hasher = StreamingHasher::new();
    hasher.update(b"hello");

    let expected = FileHashes {
        sha1: HELLO_SHA1.to_string(),
        sha512: Some("00".repeat(64)),
    };
    let err = hasher.verify("https://cdn.test/a.jar", &expected).unwrap_err();
    match err {
        ModrinthError::HashMismatch { expected, .. } => assert_eq!(expected.len(), 128),
        other => panic!("unexpected error: {other}"),
    }
}
