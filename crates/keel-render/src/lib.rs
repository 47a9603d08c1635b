//! Backend-agnostic GPU render frontend.
//!
//! This crate provides:
//! - Fixed-capacity resource pools with an explicit create / initialize /
//!   destroy lifecycle, orchestrated by [`Frontend`].
//! - A double-buffered per-frame command arena (see [`CommandArena`])
//!   recording tagged resource and draw commands.
//! - Write-once descriptions for buffers, textures, render targets and
//!   shader programs, validated before the backend constructs them.
//! - Hash-diffed fixed-function pipeline state blocks (see [`state`]).
//! - The [`RenderBackend`] trait consuming recorded frames, plus the
//!   [`NullBackend`] and [`RecordingBackend`] test doubles.
#![forbid(unsafe_code)]

mod arena;
mod backend;
mod bitset;
mod buffer;
mod command;
mod error;
mod frontend;
mod pool;
mod program;
mod resource;
mod stats;
mod tag;
mod target;
mod texture;

pub mod state;

pub use arena::{ArenaError, CommandArena, PayloadSlice, RecordedFrame, PAYLOAD_ALIGNMENT};
pub use backend::{AllocationInfo, NullBackend, ObservedCommand, RecordingBackend, RenderBackend};
pub use bitset::Bitset;
pub use buffer::{Attribute, AttributeKind, Buffer, BufferError, BufferKind, ElementKind};
pub use command::{
    BlitCmd, ClearCmd, Color, Command, CommandEntry, CommandError, CommandKind, DrawBuffers,
    DrawCmd, PrimitiveKind, TextureBinding, TextureBindings, MAX_COLOR_ATTACHMENTS,
    MAX_TEXTURE_UNITS,
};
pub use error::{FrontendError, RecordError};
pub use frontend::{Frontend, FrontendOptions, ResourceGuard};
pub use pool::{Pool, PoolItem};
pub use program::{
    Program, ProgramError, Shader, ShaderKind, Uniform, UniformKind, UniformRecord, UniformRecords,
    MAX_BONES,
};
pub use resource::{
    BufferHandle, LifeState, ProgramHandle, ResourceKind, ResourceRef, TargetHandle,
    Texture1DHandle, Texture2DHandle, Texture3DHandle, TextureCubeHandle,
};
pub use state::State;
pub use stats::{FrontendCounters, FrontendStatsSnapshot, ResourceStats};
pub use tag::Tag;
pub use target::{Target, TargetError};
pub use texture::{
    CubeFace, Extent, Extent1D, Extent2D, Extent3D, ExtentCube, Filter, Format, LevelInfo,
    Texture, Texture1D, Texture2D, Texture3D, TextureCube, TextureError, TextureKind, Wrap,
    Wrap2D, Wrap3D, WrapOptions,
};
