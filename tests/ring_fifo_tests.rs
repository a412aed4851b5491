//! Byte FIFO ordering and overflow tests

use aat_wifi_bridge::ByteFifo;

#[test]
fn test_fifo_law_without_overflow() {
    let fifo: ByteFifo<64> = ByteFifo::new();

    assert_eq!(fifo.push(b"first "), 6);
    assert_eq!(fifo.push(b"second "), 7);
    assert_eq!(fifo.push(b"third"), 5);

    let mut out = [0u8; 18];
    assert_eq!(fifo.get(&mut out), 18);
    assert_eq!(&out, b"first second third");
}

#[test]
fn test_overflow_accepts_exactly_free_space() {
    let fifo: ByteFifo<8> = ByteFifo::new();

    assert_eq!(fifo.push(b"01234"), 5);
    // Three slots free; the rest of the six bytes is dropped.
    assert_eq!(fifo.push(b"abcdef"), 3);
    assert_eq!(fifo.available(), 8);
    assert_eq!(fifo.free_space(), 0);

    // Previously stored data is untouched, accepted bytes follow in order.
    let mut out = [0u8; 8];
    assert_eq!(fifo.get(&mut out), 8);
    assert_eq!(&out, b"01234abc");
}

#[test]
fn test_capacity_four_scenario() {
    let fifo: ByteFifo<4> = ByteFifo::new();

    assert_eq!(fifo.push(b"ABC"), 3);
    assert_eq!(fifo.available(), 3);

    assert_eq!(fifo.push(b"DE"), 1);
    assert_eq!(fifo.available(), 4);

    let mut out = [0u8; 2];
    assert_eq!(fifo.get(&mut out), 2);
    assert_eq!(&out, b"AB");
    assert_eq!(fifo.available(), 2);
}

#[test]
fn test_push_to_tail_read_first() {
    let fifo: ByteFifo<8> = ByteFifo::new();

    assert_eq!(fifo.push_to_tail(b"X"), 1);
    assert_eq!(fifo.push_to_tail(b"Y"), 1);

    let mut out = [0u8; 2];
    assert_eq!(fifo.get(&mut out), 2);
    assert_eq!(&out, b"YX");
}

#[test]
fn test_push_to_tail_respects_capacity() {
    let fifo: ByteFifo<4> = ByteFifo::new();

    fifo.push(b"abc");
    assert_eq!(fifo.push_to_tail(b"XY"), 1);

    let mut out = [0u8; 4];
    assert_eq!(fifo.get(&mut out), 4);
    assert_eq!(&out, b"Xabc");
}

#[test]
fn test_peek_matches_read_order() {
    let fifo: ByteFifo<8> = ByteFifo::new();
    fifo.push(b"scan");

    for (i, &expected) in b"scan".iter().enumerate() {
        assert_eq!(fifo.peek_at(i), Some(expected));
    }
    assert_eq!(fifo.peek_at(4), None);

    // Peeking consumed nothing.
    let mut out = [0u8; 4];
    assert_eq!(fifo.get(&mut out), 4);
    assert_eq!(&out, b"scan");
}

#[test]
fn test_sustained_traffic_with_odd_capacity() {
    // Capacity deliberately not a power of two; the cursors wrap by
    // comparison, so nothing may assume masking.
    let fifo: ByteFifo<7> = ByteFifo::new();
    let mut next_in = 0u8;
    let mut next_out = 0u8;

    for _ in 0..200 {
        let chunk = [next_in, next_in.wrapping_add(1), next_in.wrapping_add(2)];
        let accepted = fifo.push(&chunk);
        next_in = next_in.wrapping_add(accepted as u8);

        let mut out = [0u8; 2];
        let taken = fifo.get(&mut out);
        for &byte in &out[..taken] {
            assert_eq!(byte, next_out);
            next_out = next_out.wrapping_add(1);
        }
    }

    // Drain the leftovers and confirm the sequence never skipped.
    let mut out = [0u8; 7];
    let taken = fifo.get(&mut out);
    for &byte in &out[..taken] {
        assert_eq!(byte, next_out);
        next_out = next_out.wrapping_add(1);
    }
    assert_eq!(next_out, next_in);
    assert!(fifo.is_empty());
}

#[test]
fn test_clear_then_reuse() {
    let fifo: ByteFifo<8> = ByteFifo::new();

    fifo.push(b"stale");
    fifo.clear();
    assert!(fifo.is_empty());
    assert_eq!(fifo.free_space(), 8);

    fifo.push(b"fresh");
    let mut out = [0u8; 5];
    assert_eq!(fifo.get(&mut out), 5);
    assert_eq!(&out, b"fresh");
}
