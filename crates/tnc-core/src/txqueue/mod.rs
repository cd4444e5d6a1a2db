// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-channel transmit queue with high/low priority FIFOs (§4.5).
//!
//! Every channel owns one [`TxQueue`]: a bounded pair of FIFOs (a "high"
//! queue for digipeated/priority traffic and a "low" queue for
//! everything else) guarded by a single mutex, with a condvar the CSMA
//! scheduler thread (§4.6) blocks on when both are empty.

use crate::config::DEFAULT_TX_QUEUE_LIMIT;
use log::warn;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Queue priority lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Digipeated/expedited traffic, drained before `Low`.
    High,
    /// Ordinary originated traffic.
    Low,
}

/// Transmit queue failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue for the requested priority was at its configured bound.
    Full,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "transmit queue full"),
        }
    }
}

impl std::error::Error for QueueError {}

struct Lanes {
    high: VecDeque<Vec<u8>>,
    low: VecDeque<Vec<u8>>,
}

/// Bounded, two-priority per-channel transmit queue.
pub struct TxQueue {
    lanes: Mutex<Lanes>,
    not_empty: Condvar,
    limit: usize,
}

impl TxQueue {
    /// Build a queue with [`DEFAULT_TX_QUEUE_LIMIT`] frames per lane.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_TX_QUEUE_LIMIT)
    }

    /// Build a queue bounding each lane at `limit` frames.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            lanes: Mutex::new(Lanes {
                high: VecDeque::new(),
                low: VecDeque::new(),
            }),
            not_empty: Condvar::new(),
            limit,
        }
    }

    /// Append a frame to the given lane.
    ///
    /// On overflow the frame is dropped and logged rather than blocking
    /// the caller (§4.5: a stalled channel must not back-pressure the
    /// demodulator or digipeater threads feeding this queue).
    pub fn push(&self, priority: Priority, frame: Vec<u8>) -> Result<(), QueueError> {
        let mut lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
        let lane = match priority {
            Priority::High => &mut lanes.high,
            Priority::Low => &mut lanes.low,
        };
        if lane.len() >= self.limit {
            warn!("txqueue: {priority:?} lane full ({} frames), dropping", self.limit);
            return Err(QueueError::Full);
        }
        lane.push_back(frame);
        drop(lanes);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pop the next frame, preferring the high-priority lane, without
    /// blocking.
    #[must_use]
    pub fn try_pop(&self) -> Option<Vec<u8>> {
        let mut lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
        lanes.high.pop_front().or_else(|| lanes.low.pop_front())
    }

    /// Block until a frame is available or `timeout` elapses, then pop
    /// it (high-priority lane first).
    ///
    /// Returns `None` on timeout; used by the CSMA scheduler thread
    /// (§4.6) so it can still notice shutdown requests while idle.
    pub fn wait_while_empty(&self, timeout: Duration) -> Option<Vec<u8>> {
        let lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
        let (mut lanes, timed_out) = self
            .not_empty
            .wait_timeout_while(lanes, timeout, |l| l.high.is_empty() && l.low.is_empty())
            .unwrap_or_else(|e| e.into_inner());
        if timed_out.timed_out() {
            return None;
        }
        lanes.high.pop_front().or_else(|| lanes.low.pop_front())
    }

    /// Number of frames queued across both lanes.
    #[must_use]
    pub fn count(&self) -> usize {
        let lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
        lanes.high.len() + lanes.low.len()
    }

    /// Whether both lanes are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Default for TxQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn high_priority_drains_before_low() {
        let q = TxQueue::new();
        q.push(Priority::Low, vec![1]).unwrap();
        q.push(Priority::High, vec![2]).unwrap();
        assert_eq!(q.try_pop(), Some(vec![2]));
        assert_eq!(q.try_pop(), Some(vec![1]));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn overflow_is_rejected_not_blocking() {
        let q = TxQueue::with_limit(2);
        q.push(Priority::Low, vec![1]).unwrap();
        q.push(Priority::Low, vec![2]).unwrap();
        assert!(matches!(q.push(Priority::Low, vec![3]), Err(QueueError::Full)));
        assert_eq!(q.count(), 2);
    }

    #[test]
    fn wait_while_empty_times_out() {
        let q = TxQueue::new();
        let result = q.wait_while_empty(Duration::from_millis(20));
        assert!(result.is_none());
    }

    #[test]
    fn wait_while_empty_wakes_on_push() {
        let q = Arc::new(TxQueue::new());
        let q2 = q.clone();
        let handle = thread::spawn(move || q2.wait_while_empty(Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(20));
        q.push(Priority::High, vec![9]).unwrap();
        assert_eq!(handle.join().unwrap(), Some(vec![9]));
    }

    #[test]
    fn lanes_are_independent_bounds() {
        let q = TxQueue::with_limit(1);
        q.push(Priority::High, vec![1]).unwrap();
        assert!(q.push(Priority::Low, vec![2]).is_ok());
        assert_eq!(q.count(), 2);
    }
}
