//! The contract between the frontend and a rendering device.

use crate::arena::RecordedFrame;
use crate::command::{Command, CommandEntry, CommandKind};
use crate::resource::ResourceKind;

/// Per-resource shadow object sizes a backend reports, in bytes.
///
/// The frontend multiplies these by live slot counts to estimate how much
/// device-side memory the pools have reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationInfo {
    pub buffer_size: usize,
    pub target_size: usize,
    pub program_size: usize,
    pub texture1d_size: usize,
    pub texture2d_size: usize,
    pub texture3d_size: usize,
    pub texture_cube_size: usize,
}

impl AllocationInfo {
    pub fn size_for(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Buffer => self.buffer_size,
            ResourceKind::Target => self.target_size,
            ResourceKind::Program => self.program_size,
            ResourceKind::Texture1D => self.texture1d_size,
            ResourceKind::Texture2D => self.texture2d_size,
            ResourceKind::Texture3D => self.texture3d_size,
            ResourceKind::TextureCube => self.texture_cube_size,
        }
    }
}

/// The device half of the renderer.
///
/// [`Frontend::process`](crate::Frontend::process) walks a recorded frame and
/// hands every entry here in record order, outside the frontend lock;
/// [`swap`](Self::swap) presents the swapchain. Implementations translate
/// entries into calls of their graphics API.
pub trait RenderBackend {
    fn allocation_info(&self) -> AllocationInfo;

    /// Execute one recorded command. `frame` resolves the entry's payload
    /// slices. An error abandons the rest of the frame.
    fn process(&mut self, frame: &RecordedFrame, entry: &CommandEntry) -> Result<(), String>;

    /// Present the swapchain target.
    fn swap(&mut self);
}

/// Backend that accepts and discards every command.
///
/// Useful headless: resources still move through their full lifecycle, frames
/// are still recorded and consumed, nothing is rendered.
#[derive(Debug, Default)]
pub struct NullBackend;

impl RenderBackend for NullBackend {
    fn allocation_info(&self) -> AllocationInfo {
        AllocationInfo::default()
    }

    fn process(&mut self, _frame: &RecordedFrame, _entry: &CommandEntry) -> Result<(), String> {
        Ok(())
    }

    fn swap(&mut self) {}
}

/// What a [`RecordingBackend`] saw for one command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedCommand {
    pub kind: CommandKind,
    pub description: &'static str,
    /// Bytes of frame payload the command referenced.
    pub payload_len: usize,
}

/// Backend that logs what it is asked to do, for tests and captures.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub observed: Vec<ObservedCommand>,
    pub swaps: usize,
    pub info: AllocationInfo,
    /// When set, every command of this kind fails.
    pub fail_on: Option<CommandKind>,
}

impl RenderBackend for RecordingBackend {
    fn allocation_info(&self) -> AllocationInfo {
        self.info
    }

    fn process(&mut self, frame: &RecordedFrame, entry: &CommandEntry) -> Result<(), String> {
        let kind = entry.command.kind();
        if self.fail_on == Some(kind) {
            return Err(format!("injected failure at {}", entry.tag));
        }
        let payload_len = match &entry.command {
            Command::Draw(draw) => frame.payload(draw.uniforms).len(),
            _ => 0,
        };
        self.observed.push(ObservedCommand {
            kind,
            description: entry.tag.description,
            payload_len,
        });
        Ok(())
    }

    fn swap(&mut self) {
        self.swaps += 1;
    }
}
