//! Tests for key encoding
//!
//! These tests verify:
//! - Primary keys group by namespace in byte order
//! - Unique index keys sort by timestamp, then primary key
//! - Legacy index keys collide and misorder across digit widths

use recordstore::keys::{self, IndexKind};
use recordstore::IndexKeyScheme;

// =============================================================================
// Primary Key Tests
// =============================================================================

#[test]
fn test_primary_keys_group_by_namespace() {
    let mut sorted = vec![
        keys::primary_key("B", "1"),
        keys::primary_key("A", "2"),
        keys::primary_key("A", "1"),
        keys::primary_key("AB", "1"),
    ];
    sorted.sort();

    let prefix = keys::namespace_prefix("A");
    let in_a: Vec<_> = sorted.iter().filter(|k| k.starts_with(&prefix)).collect();
    assert_eq!(in_a, vec![&b"A_1".to_vec(), &b"A_2".to_vec()]);
}

#[test]
fn test_ids_may_contain_separator() {
    let key = keys::primary_key("S", "a_b");
    assert_eq!(key, b"S_a_b".to_vec());
    assert!(key.starts_with(&keys::namespace_prefix("S")));
}

// =============================================================================
// Unique Scheme Tests
// =============================================================================

#[test]
fn test_unique_keys_sort_numerically() {
    let pk = keys::primary_key("S", "1");
    let mut stamps = vec![100_000i64, 9, 1_700_000_000, 99, 0];
    let mut encoded: Vec<Vec<u8>> = stamps
        .iter()
        .map(|&ts| keys::index_key(IndexKeyScheme::Unique, ts, IndexKind::Created, &pk))
        .collect();

    encoded.sort();
    stamps.sort();

    let expected: Vec<Vec<u8>> = stamps
        .iter()
        .map(|&ts| keys::index_key(IndexKeyScheme::Unique, ts, IndexKind::Created, &pk))
        .collect();
    assert_eq!(encoded, expected);
}

#[test]
fn test_unique_keys_never_collide() {
    let a = keys::index_key(
        IndexKeyScheme::Unique,
        100,
        IndexKind::Created,
        &keys::primary_key("S", "1"),
    );
    let b = keys::index_key(
        IndexKeyScheme::Unique,
        100,
        IndexKind::Created,
        &keys::primary_key("S", "2"),
    );
    assert_ne!(a, b);
    assert!(a < b);
}

#[test]
fn test_kinds_share_timestamp_but_not_key() {
    let pk = keys::primary_key("S", "1");
    let created = keys::index_key(IndexKeyScheme::Unique, 100, IndexKind::Created, &pk);
    let updated = keys::index_key(IndexKeyScheme::Unique, 100, IndexKind::Updated, &pk);

    assert_ne!(created, updated);
    assert_eq!(IndexKind::of(&created), Some(IndexKind::Created));
    assert_eq!(IndexKind::of(&updated), Some(IndexKind::Updated));
}

#[test]
fn test_namespace_named_like_kind_still_classifies() {
    // Primary key ends in "_created" but the entry is an updated entry
    let pk = keys::primary_key("S", "x_created");
    let key = keys::index_key(IndexKeyScheme::Unique, 5, IndexKind::Updated, &pk);
    assert_eq!(IndexKind::of(&key), Some(IndexKind::Updated));
}

// =============================================================================
// Legacy Scheme Tests
// =============================================================================

#[test]
fn test_legacy_keys_collide_on_timestamp() {
    let a = keys::index_key(
        IndexKeyScheme::Legacy,
        100,
        IndexKind::Created,
        &keys::primary_key("S", "1"),
    );
    let b = keys::index_key(
        IndexKeyScheme::Legacy,
        100,
        IndexKind::Created,
        &keys::primary_key("T", "9"),
    );
    assert_eq!(a, b);
    assert_eq!(a, b"100_created".to_vec());
}

#[test]
fn test_legacy_keys_misorder_across_digit_widths() {
    let pk = keys::primary_key("S", "1");
    let nine = keys::index_key(IndexKeyScheme::Legacy, 9, IndexKind::Created, &pk);
    let ten = keys::index_key(IndexKeyScheme::Legacy, 10, IndexKind::Created, &pk);

    // Byte order puts "10_" before "9_"
    assert!(ten < nine);
}

#[test]
fn test_legacy_keys_order_within_digit_width() {
    let pk = keys::primary_key("S", "1");
    let earlier = keys::index_key(IndexKeyScheme::Legacy, 1_700_000_000, IndexKind::Updated, &pk);
    let later = keys::index_key(IndexKeyScheme::Legacy, 1_700_000_001, IndexKind::Updated, &pk);
    assert!(earlier < later);
}
