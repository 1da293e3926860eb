use hil_bridge::transport::{QueueError, TxQueue};
use proptest::prelude::*;

/// Drains the queue with writes capped at `max_write` bytes, as a serial
/// writer with short writes would.
fn drain(queue: &mut TxQueue, max_write: usize) -> Vec<u8> {
    let mut wire = Vec::new();
    while let Some(pending) = queue.front_pending() {
        let n = pending.len().min(max_write);
        wire.extend_from_slice(&pending[..n]);
        queue.advance_head(n);
        queue.pop_front_if_drained();
    }
    wire
}

#[test]
fn full_queue_rejects_without_disturbing_order() {
    let mut queue = TxQueue::new(2);
    queue.push(vec![1, 2]).unwrap();
    queue.push(vec![3]).unwrap();
    assert_eq!(queue.push(vec![4]), Err(QueueError::Full { capacity: 2 }));
    assert_eq!(drain(&mut queue, 1), vec![1, 2, 3]);
    assert!(queue.is_empty());
}

proptest! {
    #[test]
    fn prop_partial_writes_deliver_in_order_exactly_once(
        frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 0..32),
        max_write in 1usize..80,
    ) {
        let mut queue = TxQueue::new(64);
        for frame in &frames {
            queue.push(frame.clone()).unwrap();
        }
        let wire = drain(&mut queue, max_write);
        prop_assert_eq!(wire, frames.concat());
        prop_assert!(queue.is_empty());
    }

    #[test]
    fn prop_length_never_exceeds_capacity(
        capacity in 1usize..16,
        pushes in 0usize..64,
    ) {
        let mut queue = TxQueue::new(capacity);
        let mut rejected = 0;
        for i in 0..pushes {
            if queue.push(vec![i as u8]).is_err() {
                rejected += 1;
            }
            prop_assert!(queue.len() <= capacity);
        }
        prop_assert_eq!(rejected, pushes.saturating_sub(capacity));
    }
}
