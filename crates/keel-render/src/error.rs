use crate::arena::ArenaError;
use crate::buffer::BufferError;
use crate::command::CommandError;
use crate::program::ProgramError;
use crate::resource::ResourceKind;
use crate::target::TargetError;
use crate::texture::TextureError;

/// Failure of a record-once description field.
///
/// Resource descriptions are write-once: each field must be recorded exactly
/// once before the resource is initialized.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    #[error("{field} already recorded")]
    AlreadyRecorded { field: &'static str },
    #[error("{field} not recorded")]
    Missing { field: &'static str },
}

/// Any failure surfaced by [`Frontend`](crate::Frontend) operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FrontendError {
    #[error("{kind} pool exhausted (capacity {capacity})")]
    PoolExhausted {
        kind: ResourceKind,
        capacity: usize,
    },
    #[error("no live {kind} at index {index}")]
    InvalidHandle { kind: ResourceKind, index: u32 },
    #[error("{kind} {index} is not ready")]
    NotReady { kind: ResourceKind, index: u32 },
    #[error("{kind} {index} is already initialized")]
    AlreadyInitialized { kind: ResourceKind, index: u32 },
    #[error("{kind} {index} is already destroyed")]
    AlreadyDestroyed { kind: ResourceKind, index: u32 },
    #[error("{kind} {index} is not dynamic")]
    NotDynamic { kind: ResourceKind, index: u32 },
    #[error("clear requests the {aspect} aspect but the target has none")]
    ClearAspectMissing { aspect: &'static str },
    #[error("render frontend mutex poisoned")]
    Poisoned,
    #[error("backend: {0}")]
    Backend(String),
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Command(#[from] CommandError),
}
