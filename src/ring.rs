//! Lock-free SPSC byte ring carrying whole frames.
//!
//! # Architecture
//!
//! ```text
//! Ingest task ──▶ RingProducer ──▶ [ FrameRing ] ──▶ RingConsumer ──▶ Process task
//!                 try_commit        head / tail       try_consume_frame
//!                                   ready count
//! ```
//!
//! # Rules
//!
//! - Exactly one producer and one consumer, enforced by [`FrameRing::split`]
//! - Only whole frames cross the ring
//! - A rejected commit has no side effects
//! - At most `CAP - 1` bytes are unread at any time
//!
//! # Memory Ordering
//!
//! - Producer: `tail` Acquire, copy, `head` Release, `ready` fetch_add Release
//! - Consumer: `ready` Acquire, copy, `tail` Release, `ready` fetch_sub AcqRel
//!
//! The consumer's Acquire on `ready` pairs with the producer's Release
//! increment, so frame bytes are visible before the frame is counted.

use core::cell::UnsafeCell;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

use crate::config::RING_CAPACITY;
use crate::frame::{Frame, FRAME_BYTES};

/// Fixed-capacity byte ring with a frame-ready counter.
///
/// Cursors are free-running `u32` byte counts, masked into the buffer on
/// access. `CAP` must be a power of two larger than one frame.
pub struct FrameRing<const CAP: usize = RING_CAPACITY> {
    buf: UnsafeCell<[u8; CAP]>,

    /// Bytes ever written. Producer-owned.
    head: AtomicU32,

    /// Bytes ever read. Consumer-owned.
    tail: AtomicU32,

    /// Frames committed and not yet consumed.
    ready: AtomicU32,

    /// Set once the role handles have been handed out.
    split: AtomicBool,
}

// SAFETY: Single producer writes only [head, head + FRAME_BYTES) after
// checking free space; single consumer reads only [tail, tail + FRAME_BYTES)
// after observing a committed frame. The regions never overlap.
unsafe impl<const CAP: usize> Sync for FrameRing<CAP> {}
unsafe impl<const CAP: usize> Send for FrameRing<CAP> {}

impl<const CAP: usize> FrameRing<CAP> {
    const MASK: usize = CAP - 1;

    /// Create an empty ring.
    ///
    /// # Panics
    ///
    /// Panics at compile time if CAP is not a power of 2, not larger than a
    /// frame, or too large for 32-bit cursors.
    pub const fn new() -> Self {
        const {
            assert!(CAP.is_power_of_two(), "Ring capacity must be power of 2");
            assert!(CAP > FRAME_BYTES, "Ring must hold at least one frame");
            assert!(CAP <= 1 << 31, "Ring capacity exceeds cursor range");
        };

        Self {
            buf: UnsafeCell::new([0; CAP]),
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            ready: AtomicU32::new(0),
            split: AtomicBool::new(false),
        }
    }

    /// Hand out the producer and consumer handles.
    ///
    /// Returns `None` on every call after the first.
    pub fn split(&self) -> Option<(RingProducer<'_, CAP>, RingConsumer<'_, CAP>)> {
        if self.split.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some((RingProducer { ring: self }, RingConsumer { ring: self }))
    }

    /// Buffer size in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Producer cursor.
    #[inline]
    pub fn head(&self) -> u32 {
        self.head.load(Ordering::Acquire)
    }

    /// Consumer cursor.
    #[inline]
    pub fn tail(&self) -> u32 {
        self.tail.load(Ordering::Acquire)
    }

    /// Unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes that can still be written.
    #[inline]
    pub fn free(&self) -> usize {
        (CAP - 1).saturating_sub(self.len())
    }

    /// Frames waiting for the consumer.
    #[inline]
    pub fn pending_frames(&self) -> u32 {
        self.ready.load(Ordering::Acquire)
    }

    /// Copy `src` into the buffer starting at cursor `pos`.
    ///
    /// # Safety
    ///
    /// The caller must be the only writer of `[pos, pos + src.len())` and no
    /// reader may access that region concurrently.
    unsafe fn write_at(&self, pos: u32, src: &[u8]) {
        debug_assert!(src.len() <= CAP);

        let start = pos as usize & Self::MASK;
        let first = src.len().min(CAP - start);
        let base = self.buf.get() as *mut u8;

        // Second copy is empty unless the region straddles the end
        ptr::copy_nonoverlapping(src.as_ptr(), base.add(start), first);
        ptr::copy_nonoverlapping(src.as_ptr().add(first), base, src.len() - first);
    }

    /// Copy from the buffer starting at cursor `pos` into `dst`.
    ///
    /// # Safety
    ///
    /// `[pos, pos + dst.len())` must be fully written and no writer may
    /// access that region concurrently.
    unsafe fn read_at(&self, pos: u32, dst: &mut [u8]) {
        debug_assert!(dst.len() <= CAP);

        let start = pos as usize & Self::MASK;
        let first = dst.len().min(CAP - start);
        let base = self.buf.get() as *const u8;

        ptr::copy_nonoverlapping(base.add(start), dst.as_mut_ptr(), first);
        ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first), dst.len() - first);
    }

    /// Ring with both cursors parked at `pos`.
    #[cfg(test)]
    fn starting_at(pos: u32) -> Self {
        let ring = Self::new();
        ring.head.store(pos, Ordering::Relaxed);
        ring.tail.store(pos, Ordering::Relaxed);
        ring
    }
}

impl<const CAP: usize> Default for FrameRing<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write side of a [`FrameRing`]. Not `Clone`: there is one producer.
pub struct RingProducer<'a, const CAP: usize = RING_CAPACITY> {
    ring: &'a FrameRing<CAP>,
}

impl<'a, const CAP: usize> RingProducer<'a, CAP> {
    /// Commit one frame of bytes.
    ///
    /// Returns `false` without touching the ring when fewer than
    /// `FRAME_BYTES` bytes are free.
    ///
    /// # Timing
    ///
    /// O(1), one 512-byte copy. Never blocks.
    #[inline]
    pub fn try_commit(&mut self, frame: &[u8; FRAME_BYTES]) -> bool {
        let ring = self.ring;

        // Only this handle stores head
        let head = ring.head.load(Ordering::Relaxed);
        let tail = ring.tail.load(Ordering::Acquire);
        let used = head.wrapping_sub(tail) as usize;

        if CAP - 1 - used < FRAME_BYTES {
            return false;
        }

        // SAFETY: [head, head + FRAME_BYTES) is free space, written only here.
        // The consumer will not read it until `ready` is incremented.
        unsafe { ring.write_at(head, frame) };

        ring.head
            .store(head.wrapping_add(FRAME_BYTES as u32), Ordering::Release);
        ring.ready.fetch_add(1, Ordering::Release);
        true
    }

    /// Bytes that can still be written.
    #[inline]
    pub fn free(&self) -> usize {
        self.ring.free()
    }

    /// Frames waiting for the consumer.
    #[inline]
    pub fn pending_frames(&self) -> u32 {
        self.ring.pending_frames()
    }
}

/// Read side of a [`FrameRing`]. Not `Clone`: there is one consumer.
pub struct RingConsumer<'a, const CAP: usize = RING_CAPACITY> {
    ring: &'a FrameRing<CAP>,
}

impl<'a, const CAP: usize> RingConsumer<'a, CAP> {
    /// Dequeue one frame if one is ready.
    #[inline]
    pub fn try_consume_frame(&mut self) -> Option<Frame> {
        let ring = self.ring;

        if ring.ready.load(Ordering::Acquire) == 0 {
            return None;
        }

        // Only this handle stores tail
        let tail = ring.tail.load(Ordering::Relaxed);
        let mut bytes = [0u8; FRAME_BYTES];

        // SAFETY: a committed frame occupies [tail, tail + FRAME_BYTES); the
        // producer does not write there until tail moves past it.
        unsafe { ring.read_at(tail, &mut bytes) };

        ring.tail
            .store(tail.wrapping_add(FRAME_BYTES as u32), Ordering::Release);
        ring.ready.fetch_sub(1, Ordering::AcqRel);

        Some(Frame::from_le_bytes(&bytes))
    }

    /// Dequeue one frame, sleeping `poll_ms` between checks until one is ready.
    pub fn consume_frame<D: DelayNs>(&mut self, delay: &mut D, poll_ms: u32) -> Frame {
        loop {
            if let Some(frame) = self.try_consume_frame() {
                return frame;
            }
            delay.delay_ms(poll_ms);
        }
    }

    /// Frames waiting to be consumed.
    #[inline]
    pub fn pending_frames(&self) -> u32 {
        self.ring.pending_frames()
    }

    /// Unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
