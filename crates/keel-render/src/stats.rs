use std::sync::atomic::{AtomicU64, Ordering};

use crate::command::CommandKind;
use crate::resource::ResourceKind;

/// Event counters for the render frontend.
///
/// Counters are cheap to bump on the render thread and safe to read from any
/// other thread; gauges (live slots, byte usage) come from the pools at
/// snapshot time instead, see [`Frontend::stats`](crate::Frontend::stats).
#[derive(Debug, Default)]
pub struct FrontendStats {
    frames: AtomicU64,
    commands_processed: AtomicU64,
    draws: AtomicU64,
    clears: AtomicU64,
    blits: AtomicU64,
    resources_created: AtomicU64,
    resources_freed: AtomicU64,
    swaps: AtomicU64,
}

impl FrontendStats {
    pub(crate) fn inc_frames(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_processed(&self, kind: CommandKind) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
        match kind {
            CommandKind::Draw => self.draws.fetch_add(1, Ordering::Relaxed),
            CommandKind::Clear => self.clears.fetch_add(1, Ordering::Relaxed),
            CommandKind::Blit => self.blits.fetch_add(1, Ordering::Relaxed),
            _ => return,
        };
    }

    pub(crate) fn inc_resources_created(&self) {
        self.resources_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_resources_freed(&self) {
        self.resources_freed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_swaps(&self) {
        self.swaps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn counters(&self) -> FrontendCounters {
        FrontendCounters {
            frames: self.frames.load(Ordering::Relaxed),
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            blits: self.blits.load(Ordering::Relaxed),
            resources_created: self.resources_created.load(Ordering::Relaxed),
            resources_freed: self.resources_freed.load(Ordering::Relaxed),
            swaps: self.swaps.load(Ordering::Relaxed),
        }
    }
}

/// Counter portion of a [`FrontendStatsSnapshot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrontendCounters {
    /// Frames consumed by `process()`.
    pub frames: u64,
    pub commands_processed: u64,
    pub draws: u64,
    pub clears: u64,
    pub blits: u64,
    pub resources_created: u64,
    /// Slots released back to their pool after destruction.
    pub resources_freed: u64,
    pub swaps: u64,
}

/// Pool gauges for one resource kind, taken under the frontend lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Pool capacity in slots.
    pub capacity: usize,
    /// Occupied slots.
    pub live: usize,
    /// Frontend-side store bytes across occupied slots.
    pub bytes: usize,
    /// Backend-side bytes reserved for occupied slots, per
    /// [`AllocationInfo`](crate::AllocationInfo).
    pub reserved: usize,
}

/// One consistent view of the frontend's counters and pool gauges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrontendStatsSnapshot {
    pub counters: FrontendCounters,
    pub resources: [ResourceStats; ResourceKind::COUNT],
}

impl FrontendStatsSnapshot {
    pub fn resource(&self, kind: ResourceKind) -> &ResourceStats {
        &self.resources[kind.index()]
    }
}
