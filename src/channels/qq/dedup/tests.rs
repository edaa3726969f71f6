use super::*;
use proptest::prelude::*;

#[test]
fn test_first_sighting_accepted() {
    let mut window = DedupWindow::new(10);
    assert!(window.seen("m1"));
    assert_eq!(window.len(), 1);
}

#[test]
fn test_replay_rejected() {
    let mut window = DedupWindow::new(10);
    assert!(window.seen("m1"));
    assert!(!window.seen("m1"));
    assert_eq!(window.len(), 1);
}

#[test]
fn test_exact_match_only() {
    let mut window = DedupWindow::new(10);
    assert!(window.seen("m1"));
    assert!(window.seen("M1"));
    assert!(window.seen("m1 "));
}

#[test]
fn test_replay_within_capacity_rejected() {
    let mut window = DedupWindow::new(3);
    assert!(window.seen("x"));
    assert!(window.seen("a"));
    assert!(window.seen("b"));
    // Only 2 distinct ids recorded after x
    assert!(!window.seen("x"));
}

#[test]
fn test_replay_after_capacity_accepted() {
    let mut window = DedupWindow::new(3);
    assert!(window.seen("x"));
    assert!(window.seen("a"));
    assert!(window.seen("b"));
    assert!(window.seen("c"));
    // x was evicted by c
    assert!(window.seen("x"));
}

#[test]
fn test_eviction_is_fifo() {
    let mut window = DedupWindow::new(2);
    window.seen("a");
    window.seen("b");
    window.seen("c");
    assert!(!window.seen("b"));
    assert!(!window.seen("c"));
    assert_eq!(window.len(), 2);
}

#[test]
fn test_zero_capacity_clamped() {
    let mut window = DedupWindow::new(0);
    assert_eq!(window.capacity(), 1);
    assert!(window.seen("a"));
    assert!(!window.seen("a"));
    assert!(window.seen("b"));
    assert!(window.seen("a"));
}

#[test]
fn test_clear_forgets_everything() {
    let mut window = DedupWindow::default();
    assert_eq!(window.capacity(), DEFAULT_CAPACITY);
    window.seen("a");
    window.clear();
    assert!(window.is_empty());
    assert!(window.seen("a"));
}

proptest! {
    #[test]
    fn len_never_exceeds_capacity(
        capacity in 1usize..50,
        ids in proptest::collection::vec("[a-e]{1,3}", 0..200),
    ) {
        let mut window = DedupWindow::new(capacity);
        for id in &ids {
            window.seen(id);
            prop_assert!(window.len() <= capacity);
        }
    }

    #[test]
    fn immediate_replay_always_rejected(
        capacity in 1usize..50,
        ids in proptest::collection::vec("[a-z0-9]{1,8}", 1..100),
    ) {
        let mut window = DedupWindow::new(capacity);
        for id in &ids {
            window.seen(id);
            prop_assert!(!window.seen(id));
        }
    }
}
