//! Bounded transmit queue for stream links.
//!
//! Entries are written front to back by a single writer. A partial write
//! advances the head cursor; the head is only removed once fully drained.

use std::collections::VecDeque;

use bytes::Bytes;

/// Default maximum number of queued frames.
pub const DEFAULT_TX_QUEUE_CAPACITY: usize = 1000;

/// Errors produced by the transmit queue.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is at capacity; the new entry was rejected.
    #[error("transmit queue full (capacity {capacity})")]
    Full {
        /// Configured maximum number of queued frames.
        capacity: usize,
    },
}

/// Encoded bytes plus how many of them have been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundBuffer {
    data: Bytes,
    pos: usize,
}

impl OutboundBuffer {
    /// Wrap an encoded frame.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Bytes not yet written
    #[must_use]
    pub fn remaining(&self) -> Bytes {
        self.data.slice(self.pos..)
    }

    /// Bytes already written
    #[must_use]
    pub const fn written(&self) -> usize {
        self.pos
    }

    /// Total length of the frame
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame has no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether every byte has been written.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// FIFO of pending outbound frames with a fixed capacity.
#[derive(Debug)]
pub struct TxQueue {
    capacity: usize,
    queue: VecDeque<OutboundBuffer>,
}

impl Default for TxQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TX_QUEUE_CAPACITY)
    }
}

impl TxQueue {
    /// Construct a queue holding at most `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    /// Enqueue a frame, rejecting it when the queue is full.
    pub fn push(&mut self, bytes: impl Into<Bytes>) -> Result<(), QueueError> {
        if self.queue.len() >= self.capacity {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        self.queue.push_back(OutboundBuffer::new(bytes));
        Ok(())
    }

    /// Unwritten bytes of the head entry, if any.
    #[must_use]
    pub fn front_pending(&self) -> Option<Bytes> {
        self.queue
            .front()
            .filter(|head| !head.is_drained())
            .map(OutboundBuffer::remaining)
    }

    /// Head entry, if any
    #[must_use]
    pub fn front(&self) -> Option<&OutboundBuffer> {
        self.queue.front()
    }

    /// Record `n` more bytes of the head as written. Clamped to the head length.
    pub fn advance_head(&mut self, n: usize) {
        if let Some(head) = self.queue.front_mut() {
            head.pos = (head.pos + n).min(head.data.len());
        }
    }

    /// Remove the head only if it has been fully written.
    pub fn pop_front_if_drained(&mut self) -> Option<OutboundBuffer> {
        if self.queue.front()?.is_drained() {
            self.queue.pop_front()
        } else {
            None
        }
    }

    /// Drop every pending frame.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Returns number of queued frames awaiting transmission.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Determine whether the queue holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Maximum number of queued frames
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_capacity() {
        let mut queue = TxQueue::new(2);
        assert!(queue.push(vec![0; 5]).is_ok());
        assert!(queue.push(vec![1; 5]).is_ok());
        assert_eq!(
            queue.push(vec![2; 5]),
            Err(QueueError::Full { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn head_stays_until_drained() {
        let mut queue = TxQueue::default();
        queue.push(vec![1, 2, 3, 4]).unwrap();
        queue.push(vec![5]).unwrap();

        queue.advance_head(3);
        assert_eq!(queue.front_pending().unwrap().as_ref(), &[4]);
        assert!(queue.pop_front_if_drained().is_none());

        queue.advance_head(1);
        assert!(queue.front_pending().is_none());
        let done = queue.pop_front_if_drained().unwrap();
        assert_eq!(done.written(), 4);
        assert_eq!(queue.front_pending().unwrap().as_ref(), &[5]);
    }

    #[test]
    fn advance_is_clamped() {
        let mut queue = TxQueue::default();
        queue.push(vec![1, 2]).unwrap();
        queue.advance_head(10);
        assert_eq!(queue.front().map(OutboundBuffer::written), Some(2));
    }

    #[test]
    fn empty_queue_is_inert() {
        let mut queue = TxQueue::default();
        queue.advance_head(5);
        assert!(queue.front_pending().is_none());
        assert!(queue.pop_front_if_drained().is_none());
        assert_eq!(queue.capacity(), DEFAULT_TX_QUEUE_CAPACITY);
    }
}
