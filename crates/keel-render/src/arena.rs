//! Per-frame command storage.
//!
//! Commands are recorded into a fixed-budget arena: a slab of
//! [`CommandEntry`] values plus a byte block for variable-length payloads
//! (texture uploads are referenced, uniform flushes are copied). The arena is
//! double buffered so a backend can consume one frame while the next frame
//! records into the other.

use std::mem;

use crate::command::{Command, CommandEntry};
use crate::tag::Tag;

/// Alignment of every payload allocation, in bytes.
pub const PAYLOAD_ALIGNMENT: usize = 16;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    #[error("frame already holds {capacity} commands")]
    CommandsExhausted { capacity: usize },
    #[error("payload of {requested} bytes does not fit ({remaining} of {capacity} bytes left)")]
    PayloadExhausted {
        requested: usize,
        remaining: usize,
        capacity: usize,
    },
    #[error("a recorded frame is already out for consumption")]
    ConsumeInProgress,
}

/// Offset and length of a payload span within its frame's block.
///
/// A slice is only meaningful against the frame it was allocated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayloadSlice {
    offset: u32,
    len: u32,
}

impl PayloadSlice {
    pub const EMPTY: PayloadSlice = PayloadSlice { offset: 0, len: 0 };

    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    Some(value.checked_add(align - 1)? & !(align - 1))
}

struct FrameStorage {
    entries: Vec<CommandEntry>,
    block: Box<[u8]>,
    cursor: usize,
}

impl FrameStorage {
    fn new(entry_capacity: usize, block_capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(entry_capacity),
            block: vec![0_u8; block_capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

/// A frame handed out by [`CommandArena::begin_consume`].
///
/// Owns its storage, so the arena (and the lock guarding it) need not be held
/// while a backend walks the entries. Return it with
/// [`CommandArena::end_consume`] to recycle the storage.
pub struct RecordedFrame {
    storage: FrameStorage,
}

impl RecordedFrame {
    pub fn entries(&self) -> &[CommandEntry] {
        &self.storage.entries
    }

    pub fn len(&self) -> usize {
        self.storage.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.entries.is_empty()
    }

    /// Bytes of a payload span recorded into this frame.
    pub fn payload(&self, slice: PayloadSlice) -> &[u8] {
        &self.storage.block[slice.offset()..slice.offset() + slice.len()]
    }
}

/// Double-buffered command and payload storage for frames in flight.
pub struct CommandArena {
    live: FrameStorage,
    standby: Option<FrameStorage>,
    entry_capacity: usize,
    block_capacity: usize,
}

impl CommandArena {
    /// Create an arena with `command_memory` bytes of payload per frame.
    ///
    /// The entry slab is sized so a frame of payload-free commands can never
    /// outgrow it before the payload block is exhausted.
    pub fn new(command_memory: usize) -> Self {
        debug_assert!(command_memory <= u32::MAX as usize);
        let entry_capacity = (command_memory / mem::size_of::<CommandEntry>()).max(1);
        Self {
            live: FrameStorage::new(entry_capacity, command_memory),
            standby: Some(FrameStorage::new(entry_capacity, command_memory)),
            entry_capacity,
            block_capacity: command_memory,
        }
    }

    pub fn entry_capacity(&self) -> usize {
        self.entry_capacity
    }

    pub fn payload_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Commands recorded into the live frame so far.
    pub fn recorded(&self) -> usize {
        self.live.entries.len()
    }

    /// Payload bytes consumed in the live frame so far.
    pub fn payload_used(&self) -> usize {
        self.live.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.live.entries.is_empty()
    }

    /// Append a command to the live frame.
    pub fn record(&mut self, tag: Tag, command: Command) -> Result<(), ArenaError> {
        if self.live.entries.len() == self.entry_capacity {
            return Err(ArenaError::CommandsExhausted {
                capacity: self.entry_capacity,
            });
        }
        self.live.entries.push(CommandEntry { tag, command });
        Ok(())
    }

    /// Reserve a zero-filled, 16-byte aligned span of the live payload block.
    pub fn alloc_payload(&mut self, len: usize) -> Result<PayloadSlice, ArenaError> {
        if len == 0 {
            return Ok(PayloadSlice::EMPTY);
        }
        let offset = align_up(self.live.cursor, PAYLOAD_ALIGNMENT)
            .filter(|offset| *offset <= self.block_capacity)
            .ok_or(ArenaError::PayloadExhausted {
                requested: len,
                remaining: 0,
                capacity: self.block_capacity,
            })?;
        let remaining = self.block_capacity - offset;
        if len > remaining {
            return Err(ArenaError::PayloadExhausted {
                requested: len,
                remaining,
                capacity: self.block_capacity,
            });
        }
        self.live.block[offset..offset + len].fill(0);
        self.live.cursor = offset + len;
        Ok(PayloadSlice {
            offset: offset as u32,
            len: len as u32,
        })
    }

    /// Bytes of a span allocated from the live frame.
    pub fn payload(&self, slice: PayloadSlice) -> &[u8] {
        &self.live.block[slice.offset()..slice.offset() + slice.len()]
    }

    /// Writable bytes of a span allocated from the live frame.
    pub fn payload_mut(&mut self, slice: PayloadSlice) -> &mut [u8] {
        &mut self.live.block[slice.offset()..slice.offset() + slice.len()]
    }

    /// Drop everything recorded into the live frame.
    pub fn reset(&mut self) {
        self.live.reset();
    }

    /// Take the live frame for consumption and swap the standby storage in.
    ///
    /// Recording continues against the standby storage while the returned
    /// frame is walked. Fails if a frame is already out.
    pub fn begin_consume(&mut self) -> Result<RecordedFrame, ArenaError> {
        let standby = self.standby.take().ok_or(ArenaError::ConsumeInProgress)?;
        let storage = mem::replace(&mut self.live, standby);
        Ok(RecordedFrame { storage })
    }

    /// Recycle a consumed frame's storage.
    pub fn end_consume(&mut self, frame: RecordedFrame) {
        let mut storage = frame.storage;
        storage.reset();
        self.standby = Some(storage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{BlitCmd, Command};
    use crate::resource::{BufferHandle, ResourceRef, TargetHandle};
    use crate::render_tag;

    fn allocate_marker() -> Command {
        Command::ResourceAllocate(ResourceRef::Buffer(BufferHandle(0)))
    }

    #[test]
    fn record_then_consume_round_trip() {
        let mut arena = CommandArena::new(4096);
        arena.record(render_tag!("first"), allocate_marker()).unwrap();
        arena
            .record(
                render_tag!("second"),
                Command::Blit(BlitCmd {
                    src: TargetHandle(0),
                    src_attachment: 0,
                    dst: TargetHandle(1),
                    dst_attachment: 1,
                }),
            )
            .unwrap();
        assert_eq!(arena.recorded(), 2);

        let frame = arena.begin_consume().unwrap();
        assert!(arena.is_empty());
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.entries()[0].tag.description, "first");
        assert_eq!(frame.entries()[1].tag.description, "second");
        arena.end_consume(frame);
    }

    #[test]
    fn payloads_are_aligned_and_zero_filled() {
        let mut arena = CommandArena::new(4096);
        let first = arena.alloc_payload(3).unwrap();
        arena.payload_mut(first).copy_from_slice(&[1, 2, 3]);
        let second = arena.alloc_payload(5).unwrap();
        assert_eq!(first.offset(), 0);
        assert_eq!(second.offset() % PAYLOAD_ALIGNMENT, 0);
        assert_eq!(arena.payload(second), &[0; 5]);
        assert_eq!(arena.payload(first), &[1, 2, 3]);
    }

    #[test]
    fn payload_reuse_is_zeroed_after_reset() {
        let mut arena = CommandArena::new(4096);
        let slice = arena.alloc_payload(8).unwrap();
        arena.payload_mut(slice).fill(0xAB);
        arena.reset();
        assert_eq!(arena.payload_used(), 0);
        let slice = arena.alloc_payload(8).unwrap();
        assert_eq!(slice.offset(), 0);
        assert_eq!(arena.payload(slice), &[0; 8]);
    }

    #[test]
    fn reset_keeps_entry_storage() {
        let mut arena = CommandArena::new(4096);
        arena.record(render_tag!("probe"), allocate_marker()).unwrap();
        let before = arena.live.entries.as_ptr();
        arena.reset();
        arena.record(render_tag!("probe"), allocate_marker()).unwrap();
        assert_eq!(arena.live.entries.as_ptr(), before);
    }

    #[test]
    fn command_capacity_is_enforced() {
        let mut arena = CommandArena::new(mem::size_of::<CommandEntry>());
        assert_eq!(arena.entry_capacity(), 1);
        arena.record(render_tag!("only"), allocate_marker()).unwrap();
        assert_eq!(
            arena.record(render_tag!("spill"), allocate_marker()),
            Err(ArenaError::CommandsExhausted { capacity: 1 })
        );
    }

    #[test]
    fn payload_capacity_is_enforced() {
        let mut arena = CommandArena::new(64);
        arena.alloc_payload(48).unwrap();
        assert_eq!(
            arena.alloc_payload(32),
            Err(ArenaError::PayloadExhausted {
                requested: 32,
                remaining: 16,
                capacity: 64,
            })
        );
    }

    #[test]
    fn zero_length_payload_is_empty_slice() {
        let mut arena = CommandArena::new(64);
        let slice = arena.alloc_payload(0).unwrap();
        assert!(slice.is_empty());
        assert_eq!(arena.payload_used(), 0);
        assert_eq!(arena.payload(slice), &[] as &[u8]);
    }

    #[test]
    fn only_one_frame_out_at_a_time() {
        let mut arena = CommandArena::new(4096);
        arena.record(render_tag!("frame"), allocate_marker()).unwrap();
        let frame = arena.begin_consume().unwrap();
        assert!(matches!(
            arena.begin_consume(),
            Err(ArenaError::ConsumeInProgress)
        ));
        // Recording continues against the standby storage meanwhile.
        arena.record(render_tag!("next"), allocate_marker()).unwrap();
        arena.end_consume(frame);
        let frame = arena.begin_consume().unwrap();
        assert_eq!(frame.entries()[0].tag.description, "next");
        arena.end_consume(frame);
    }
}
