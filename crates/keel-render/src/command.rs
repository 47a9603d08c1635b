use crate::arena::PayloadSlice;
use crate::resource::{
    BufferHandle, ProgramHandle, ResourceRef, TargetHandle, Texture1DHandle, Texture2DHandle,
    Texture3DHandle, TextureCubeHandle,
};
use crate::state::State;
use crate::tag::Tag;

/// Color attachments a target can carry; also bounds draw-buffer lists.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Texture units a single draw can bind.
pub const MAX_TEXTURE_UNITS: usize = 8;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("draw buffer list already holds {MAX_COLOR_ATTACHMENTS} attachments")]
    DrawBuffersFull,
    #[error("color attachment index {index} out of range")]
    AttachmentOutOfRange { index: u8 },
    #[error("draw already binds {MAX_TEXTURE_UNITS} texture units")]
    TooManyTextures,
    #[error("clear requests no depth, stencil or color aspect")]
    EmptyClear,
    #[error("draw has an element count of zero")]
    EmptyDraw,
}

/// RGBA color, unclamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT_BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Ordered list of color attachment indices a command writes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawBuffers {
    elements: [u8; MAX_COLOR_ATTACHMENTS],
    count: u8,
}

impl DrawBuffers {
    pub const fn new() -> Self {
        Self {
            elements: [0; MAX_COLOR_ATTACHMENTS],
            count: 0,
        }
    }

    /// Draw-buffer list naming only attachment 0.
    pub const fn first() -> Self {
        let mut buffers = Self::new();
        buffers.count = 1;
        buffers
    }

    /// Append `attachment` to the list.
    pub fn add(&mut self, attachment: u8) -> Result<(), CommandError> {
        if attachment as usize >= MAX_COLOR_ATTACHMENTS {
            return Err(CommandError::AttachmentOutOfRange { index: attachment });
        }
        if self.count as usize == MAX_COLOR_ATTACHMENTS {
            return Err(CommandError::DrawBuffersFull);
        }
        self.elements[self.count as usize] = attachment;
        self.count += 1;
        Ok(())
    }

    pub fn indices(&self) -> &[u8] {
        &self.elements[..self.count as usize]
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// A typed texture bound to one sampler unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureBinding {
    Texture1D(Texture1DHandle),
    Texture2D(Texture2DHandle),
    Texture3D(Texture3DHandle),
    TextureCube(TextureCubeHandle),
}

/// Textures bound for a draw, in unit order.
///
/// Units are assigned in the order textures are added; [`TextureBindings::add`]
/// returns the unit so callers can record it into a sampler uniform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureBindings {
    units: [Option<TextureBinding>; MAX_TEXTURE_UNITS],
    count: u8,
}

impl TextureBindings {
    pub const fn new() -> Self {
        Self {
            units: [None; MAX_TEXTURE_UNITS],
            count: 0,
        }
    }

    /// Bind `texture` to the next free unit and return that unit.
    pub fn add(&mut self, texture: TextureBinding) -> Result<usize, CommandError> {
        let unit = self.count as usize;
        if unit == MAX_TEXTURE_UNITS {
            return Err(CommandError::TooManyTextures);
        }
        self.units[unit] = Some(texture);
        self.count += 1;
        Ok(unit)
    }

    pub fn get(&self, unit: usize) -> Option<TextureBinding> {
        self.units.get(unit).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, TextureBinding)> + '_ {
        self.units[..self.count as usize]
            .iter()
            .enumerate()
            .filter_map(|(unit, binding)| Some((unit, (*binding)?)))
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
    TriangleStrip,
    TriangleFan,
    Points,
    Lines,
}

/// Payload of a [`Command::Clear`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearCmd {
    pub target: TargetHandle,
    pub draw_buffers: DrawBuffers,
    /// Depth clear value, when the depth aspect is cleared.
    pub depth: Option<f32>,
    /// Stencil clear value, when the stencil aspect is cleared.
    pub stencil: Option<u8>,
    /// Per-attachment clear colors, indexed by attachment.
    pub colors: [Option<Color>; MAX_COLOR_ATTACHMENTS],
}

impl ClearCmd {
    pub fn clears_anything(&self) -> bool {
        self.depth.is_some() || self.stencil.is_some() || self.colors.iter().any(Option::is_some)
    }
}

/// Payload of a [`Command::Draw`].
///
/// `uniforms` names a span of the frame payload holding this draw's flushed
/// dirty uniforms; decode it with [`UniformRecords`](crate::UniformRecords).
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCmd {
    pub state: State,
    pub target: TargetHandle,
    pub buffer: BufferHandle,
    pub program: ProgramHandle,
    pub draw_buffers: DrawBuffers,
    pub textures: TextureBindings,
    pub primitive: PrimitiveKind,
    /// Elements (or vertices, for non-indexed buffers) to draw.
    pub count: u32,
    /// First element (or vertex) of the range.
    pub offset: u32,
    pub uniforms: PayloadSlice,
}

/// Payload of a [`Command::Blit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlitCmd {
    pub src: TargetHandle,
    pub src_attachment: u8,
    pub dst: TargetHandle,
    pub dst_attachment: u8,
}

/// One backend-visible operation recorded into a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// A pool slot was reserved for the referenced resource.
    ResourceAllocate(ResourceRef),
    /// The referenced resource was validated; the backend should build it.
    ResourceConstruct(ResourceRef),
    /// The referenced resource's stores changed; the backend should re-upload.
    ResourceUpdate(ResourceRef),
    /// The referenced resource is going away after this frame.
    ResourceDestroy(ResourceRef),
    Clear(ClearCmd),
    Draw(DrawCmd),
    Blit(BlitCmd),
}

/// Discriminant of a [`Command`], for dispatch and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ResourceAllocate,
    ResourceConstruct,
    ResourceUpdate,
    ResourceDestroy,
    Clear,
    Draw,
    Blit,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::ResourceAllocate(_) => CommandKind::ResourceAllocate,
            Command::ResourceConstruct(_) => CommandKind::ResourceConstruct,
            Command::ResourceUpdate(_) => CommandKind::ResourceUpdate,
            Command::ResourceDestroy(_) => CommandKind::ResourceDestroy,
            Command::Clear(_) => CommandKind::Clear,
            Command::Draw(_) => CommandKind::Draw,
            Command::Blit(_) => CommandKind::Blit,
        }
    }
}

/// A recorded command plus the tag of the call that recorded it.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandEntry {
    pub tag: Tag,
    pub command: Command,
}
