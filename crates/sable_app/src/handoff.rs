//! Frame hand-off between the render thread and the presenting thread
//!
//! One mutex guards the slot bookkeeping; a condvar wakes the writer when a
//! slot frees up. Each slot is in at most one of three roles: being written,
//! holding the latest completed frame, or being presented.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::MIN_SWAP_CHAIN_DEPTH;

/// How long the writer sleeps before rechecking the terminate flag
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// A completed frame handed to the presenter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletedFrame {
    pub slot: usize,
    pub sequence: u64,
}

#[derive(Debug)]
struct SlotState {
    depth: usize,
    writing: Option<usize>,
    presenting: Option<usize>,
    latest: Option<CompletedFrame>,
    next_sequence: u64,
}

impl SlotState {
    fn is_free(&self, slot: usize) -> bool {
        self.writing != Some(slot)
            && self.presenting != Some(slot)
            && self.latest.map(|f| f.slot) != Some(slot)
    }

    fn free_slot(&self) -> Option<usize> {
        (0..self.depth).find(|&slot| self.is_free(slot))
    }
}

/// Slot bookkeeping shared by the writer and the presenter
#[derive(Debug)]
pub struct FrameHandoff {
    state: Mutex<SlotState>,
    slot_freed: Condvar,
}

impl FrameHandoff {
    /// Hand-off over `depth` slots, raised to at least two so the writer
    /// always has a slot besides the latest frame
    pub fn new(depth: usize) -> Self {
        Self {
            state: Mutex::new(SlotState {
                depth: depth.max(MIN_SWAP_CHAIN_DEPTH),
                writing: None,
                presenting: None,
                latest: None,
                next_sequence: 1,
            }),
            slot_freed: Condvar::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.state.lock().depth
    }

    /// Block until a slot can be written; `None` once `terminate` is set
    pub fn acquire_write(&self, terminate: &AtomicBool) -> Option<usize> {
        let mut state = self.state.lock();
        loop {
            if terminate.load(Ordering::Acquire) {
                return None;
            }
            if state.writing.is_none() {
                if let Some(slot) = state.free_slot() {
                    state.writing = Some(slot);
                    tracing::debug!("Acquired swap slot {} for writing", slot);
                    return Some(slot);
                }
            }
            self.slot_freed.wait_for(&mut state, WAIT_SLICE);
        }
    }

    /// Mark `slot` as the newest completed frame and return its sequence
    pub fn publish(&self, slot: usize) -> u64 {
        let mut state = self.state.lock();
        if state.writing != Some(slot) {
            tracing::warn!("Publishing slot {} that was not acquired for writing", slot);
        }
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.writing = None;
        state.latest = Some(CompletedFrame { slot, sequence });
        drop(state);
        self.slot_freed.notify_all();
        sequence
    }

    /// Give up a slot without publishing it
    pub fn abandon(&self, slot: usize) {
        let mut state = self.state.lock();
        if state.writing == Some(slot) {
            state.writing = None;
        }
        drop(state);
        self.slot_freed.notify_all();
    }

    /// Sequence of the newest completed frame
    pub fn latest_sequence(&self) -> Option<u64> {
        self.state.lock().latest.map(|f| f.sequence)
    }

    /// Take the newest completed frame for presentation
    ///
    /// Returns `None` if nothing has completed yet or a frame is already
    /// being presented. Call [`release`](Self::release) when done.
    pub fn acquire_latest(&self) -> Option<CompletedFrame> {
        let mut state = self.state.lock();
        if state.presenting.is_some() {
            return None;
        }
        let frame = state.latest?;
        state.presenting = Some(frame.slot);
        Some(frame)
    }

    /// Finish presenting `slot`
    pub fn release(&self, slot: usize) {
        let mut state = self.state.lock();
        if state.presenting == Some(slot) {
            state.presenting = None;
        }
        drop(state);
        self.slot_freed.notify_all();
    }

    /// Wake a writer blocked in [`acquire_write`](Self::acquire_write)
    pub fn wake(&self) {
        self.slot_freed.notify_all();
    }
}
