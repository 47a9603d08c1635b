//! Texture descriptions for the four texture shapes.
//!
//! All shapes share one generic [`Texture`] record parameterized by an
//! [`Extent`]: the extent carries the dimension arithmetic (pixel counts,
//! halving, face count) while the record carries the store, format, filter
//! and wrap. Mip levels are concatenated in the byte store; level offsets
//! are derived by walking the geometric series of level sizes rather than
//! stored per level.

use std::fmt;

use crate::command::Color;
use crate::error::{FrontendError, RecordError};
use crate::pool::PoolItem;
use crate::resource::{LifeState, ResourceKind};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum TextureError {
    #[error("{kind} textures cannot hold a compressed format")]
    CompressionUnsupported { kind: ResourceKind },
    #[error("compressed textures need sides of at least 4 pixels")]
    TooSmallForCompression,
    #[error("mipmapped textures need power-of-two dimensions")]
    NotPowerOfTwo,
    #[error("mipmap level {level} out of range for {levels} levels")]
    LevelOutOfRange { level: usize, levels: usize },
    #[error("write of {len} bytes does not fill the {expected} byte span")]
    WrongLevelSize { len: usize, expected: usize },
    #[error("attachment textures carry no CPU-side store")]
    NoStore,
    #[error("static texture contents are sealed after initialization")]
    Sealed,
    #[error("wrap clamps to border but no border color is recorded")]
    MissingBorder,
}

/// Pixel format of a texture store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    RU8,
    RgbaU8,
    BgraU8,
    RgbaF16,
    BgraF16,
    D16,
    D24,
    D32,
    D32F,
    D24S8,
    D32FS8,
    S8,
    Dxt1,
    Dxt5,
}

impl Format {
    /// Bits for one pixel; fractional block formats still divide evenly
    /// per 4x4 block.
    pub fn bits_per_pixel(self) -> usize {
        match self {
            Format::RU8 => 8,
            Format::RgbaU8 => 32,
            Format::BgraU8 => 32,
            Format::RgbaF16 => 64,
            Format::BgraF16 => 64,
            Format::D16 => 16,
            Format::D24 => 24,
            Format::D32 => 32,
            Format::D32F => 32,
            Format::D24S8 => 32,
            Format::D32FS8 => 40,
            Format::S8 => 8,
            Format::Dxt1 => 4,
            Format::Dxt5 => 8,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            Format::RU8 => 1,
            Format::RgbaU8 => 4,
            Format::BgraU8 => 4,
            Format::RgbaF16 => 4,
            Format::BgraF16 => 4,
            Format::D16 => 1,
            Format::D24 => 1,
            Format::D32 => 1,
            Format::D32F => 1,
            Format::D24S8 => 2,
            Format::D32FS8 => 2,
            Format::S8 => 1,
            Format::Dxt1 => 3,
            Format::Dxt5 => 4,
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, Format::Dxt1 | Format::Dxt5)
    }

    /// Bytes per 4x4 block for block-compressed formats.
    pub fn block_bytes(self) -> Option<usize> {
        match self {
            Format::Dxt1 => Some(8),
            Format::Dxt5 => Some(16),
            _ => None,
        }
    }

    pub fn is_color(self) -> bool {
        matches!(
            self,
            Format::RU8
                | Format::RgbaU8
                | Format::BgraU8
                | Format::RgbaF16
                | Format::BgraF16
                | Format::Dxt1
                | Format::Dxt5
        )
    }

    pub fn has_depth(self) -> bool {
        matches!(
            self,
            Format::D16
                | Format::D24
                | Format::D32
                | Format::D32F
                | Format::D24S8
                | Format::D32FS8
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(self, Format::S8 | Format::D24S8 | Format::D32FS8)
    }

    pub fn is_depth_only(self) -> bool {
        self.has_depth() && !self.has_stencil()
    }

    pub fn is_stencil_only(self) -> bool {
        self.has_stencil() && !self.has_depth()
    }

    pub fn is_depth_stencil(self) -> bool {
        self.has_depth() && self.has_stencil()
    }
}

/// Usage class of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    /// Render-target attachment; no CPU-side store.
    Attachment,
    /// Uploaded once, sealed after initialization.
    Static,
    /// Rewritable after initialization.
    Dynamic,
}

/// Sampler filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub bilinear: bool,
    pub trilinear: bool,
    pub mipmaps: bool,
}

/// Wrap behavior of one texture axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrap {
    ClampToEdge,
    ClampToBorder,
    MirroredRepeat,
    MirrorClampToEdge,
    Repeat,
}

/// Per-axis wrap bundle; lets validation ask about border clamping
/// without knowing the axis count.
pub trait WrapOptions {
    fn clamps_to_border(&self) -> bool;
}

impl WrapOptions for Wrap {
    fn clamps_to_border(&self) -> bool {
        *self == Wrap::ClampToBorder
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wrap2D {
    pub s: Wrap,
    pub t: Wrap,
}

impl Wrap2D {
    pub const fn all(wrap: Wrap) -> Self {
        Self { s: wrap, t: wrap }
    }
}

impl WrapOptions for Wrap2D {
    fn clamps_to_border(&self) -> bool {
        self.s.clamps_to_border() || self.t.clamps_to_border()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wrap3D {
    pub s: Wrap,
    pub t: Wrap,
    pub p: Wrap,
}

impl Wrap3D {
    pub const fn all(wrap: Wrap) -> Self {
        Self {
            s: wrap,
            t: wrap,
            p: wrap,
        }
    }
}

impl WrapOptions for Wrap3D {
    fn clamps_to_border(&self) -> bool {
        self.s.clamps_to_border() || self.t.clamps_to_border() || self.p.clamps_to_border()
    }
}

/// Face of a cube texture, in store order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    Right,
    Left,
    Top,
    Bottom,
    Front,
    Back,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Right,
        CubeFace::Left,
        CubeFace::Top,
        CubeFace::Bottom,
        CubeFace::Front,
        CubeFace::Back,
    ];

    pub fn index(self) -> usize {
        match self {
            CubeFace::Right => 0,
            CubeFace::Left => 1,
            CubeFace::Top => 2,
            CubeFace::Bottom => 3,
            CubeFace::Front => 4,
            CubeFace::Back => 5,
        }
    }
}

/// Dimension arithmetic for one texture shape.
pub trait Extent: Copy + Default + fmt::Debug + PartialEq {
    const KIND: ResourceKind;
    /// Stores per level; 6 for cube textures.
    const FACES: usize;
    const SUPPORTS_COMPRESSION: bool;
    type Wrap: WrapOptions + Copy + fmt::Debug + PartialEq;

    /// Pixels in one face of this level.
    fn pixel_count(&self) -> usize;
    fn max_side(&self) -> usize;
    fn min_side(&self) -> usize;
    /// The next mip level's extent; sides never shrink below 1.
    fn halved(&self) -> Self;
    fn sides_power_of_two(&self) -> bool;
    /// 4x4 blocks in one face of this level.
    fn block_count(&self) -> usize;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Extent1D {
    pub width: usize,
}

impl Extent for Extent1D {
    const KIND: ResourceKind = ResourceKind::Texture1D;
    const FACES: usize = 1;
    const SUPPORTS_COMPRESSION: bool = false;
    type Wrap = Wrap;

    fn pixel_count(&self) -> usize {
        self.width
    }

    fn max_side(&self) -> usize {
        self.width
    }

    fn min_side(&self) -> usize {
        self.width
    }

    fn halved(&self) -> Self {
        Self {
            width: (self.width / 2).max(1),
        }
    }

    fn sides_power_of_two(&self) -> bool {
        self.width.is_power_of_two()
    }

    fn block_count(&self) -> usize {
        (self.width + 3) / 4
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Extent2D {
    pub width: usize,
    pub height: usize,
}

impl Extent for Extent2D {
    const KIND: ResourceKind = ResourceKind::Texture2D;
    const FACES: usize = 1;
    const SUPPORTS_COMPRESSION: bool = true;
    type Wrap = Wrap2D;

    fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    fn max_side(&self) -> usize {
        self.width.max(self.height)
    }

    fn min_side(&self) -> usize {
        self.width.min(self.height)
    }

    fn halved(&self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
        }
    }

    fn sides_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    fn block_count(&self) -> usize {
        ((self.width + 3) / 4) * ((self.height + 3) / 4)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Extent3D {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Extent for Extent3D {
    const KIND: ResourceKind = ResourceKind::Texture3D;
    const FACES: usize = 1;
    const SUPPORTS_COMPRESSION: bool = false;
    type Wrap = Wrap3D;

    fn pixel_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    fn max_side(&self) -> usize {
        self.width.max(self.height).max(self.depth)
    }

    fn min_side(&self) -> usize {
        self.width.min(self.height).min(self.depth)
    }

    fn halved(&self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
            depth: (self.depth / 2).max(1),
        }
    }

    fn sides_power_of_two(&self) -> bool {
        self.width.is_power_of_two()
            && self.height.is_power_of_two()
            && self.depth.is_power_of_two()
    }

    fn block_count(&self) -> usize {
        ((self.width + 3) / 4) * ((self.height + 3) / 4) * self.depth
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtentCube {
    pub width: usize,
    pub height: usize,
}

impl Extent for ExtentCube {
    const KIND: ResourceKind = ResourceKind::TextureCube;
    const FACES: usize = 6;
    const SUPPORTS_COMPRESSION: bool = true;
    type Wrap = Wrap2D;

    fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    fn max_side(&self) -> usize {
        self.width.max(self.height)
    }

    fn min_side(&self) -> usize {
        self.width.min(self.height)
    }

    fn halved(&self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
        }
    }

    fn sides_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    fn block_count(&self) -> usize {
        ((self.width + 3) / 4) * ((self.height + 3) / 4)
    }
}

/// Byte size of one whole level (all faces) of `extent` in `format`.
pub(crate) fn level_byte_size<E: Extent>(extent: &E, format: Format) -> usize {
    let face = match format.block_bytes() {
        Some(block) => extent.block_count() * block,
        None => extent.pixel_count() * format.bits_per_pixel() / 8,
    };
    face * E::FACES
}

/// Placement of one mip level within the byte store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelInfo<E> {
    pub offset: usize,
    pub size: usize,
    pub dimensions: E,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct Recorded: u8 {
        const KIND = 1 << 0;
        const FORMAT = 1 << 1;
        const FILTER = 1 << 2;
        const WRAP = 1 << 3;
        const DIMENSIONS = 1 << 4;
        const BORDER = 1 << 5;
    }
}

/// A texture description and its CPU-side store.
#[derive(Debug)]
pub struct Texture<E: Extent> {
    life: LifeState,
    recorded: Recorded,
    kind: TextureKind,
    format: Format,
    filter: Filter,
    wrap: Option<E::Wrap>,
    border: Option<Color>,
    extent: E,
    data: Vec<u8>,
}

pub type Texture1D = Texture<Extent1D>;
pub type Texture2D = Texture<Extent2D>;
pub type Texture3D = Texture<Extent3D>;
pub type TextureCube = Texture<ExtentCube>;

impl<E: Extent> Default for Texture<E> {
    fn default() -> Self {
        Self {
            life: LifeState::default(),
            recorded: Recorded::default(),
            kind: TextureKind::Static,
            format: Format::RU8,
            filter: Filter::default(),
            wrap: None,
            border: None,
            extent: E::default(),
            data: Vec::new(),
        }
    }
}

impl<E: Extent> Texture<E> {
    fn record(&mut self, field: Recorded, name: &'static str) -> Result<(), RecordError> {
        if self.recorded.contains(field) {
            return Err(RecordError::AlreadyRecorded { field: name });
        }
        self.recorded.insert(field);
        Ok(())
    }

    fn require(&self, field: Recorded, name: &'static str) -> Result<(), RecordError> {
        if !self.recorded.contains(field) {
            return Err(RecordError::Missing { field: name });
        }
        Ok(())
    }

    pub fn record_kind(&mut self, kind: TextureKind) -> Result<(), RecordError> {
        self.record(Recorded::KIND, "texture kind")?;
        self.kind = kind;
        Ok(())
    }

    pub fn record_format(&mut self, format: Format) -> Result<(), RecordError> {
        self.record(Recorded::FORMAT, "texture format")?;
        self.format = format;
        Ok(())
    }

    pub fn record_filter(&mut self, filter: Filter) -> Result<(), RecordError> {
        self.record(Recorded::FILTER, "texture filter")?;
        self.filter = filter;
        Ok(())
    }

    pub fn record_wrap(&mut self, wrap: E::Wrap) -> Result<(), RecordError> {
        self.record(Recorded::WRAP, "texture wrap")?;
        self.wrap = Some(wrap);
        Ok(())
    }

    /// Border color for [`Wrap::ClampToBorder`] axes.
    pub fn record_border(&mut self, border: Color) -> Result<(), RecordError> {
        self.record(Recorded::BORDER, "texture border")?;
        self.border = Some(border);
        Ok(())
    }

    /// Record the dimensions and size the store for the whole mip chain.
    ///
    /// Kind, format and filter must be recorded first: they decide the level
    /// count and whether a store is allocated at all (attachments carry
    /// none).
    pub fn record_dimensions(&mut self, extent: E) -> Result<(), FrontendError> {
        if self.recorded.contains(Recorded::DIMENSIONS) {
            return Err(RecordError::AlreadyRecorded {
                field: "texture dimensions",
            }
            .into());
        }
        self.require(Recorded::KIND, "texture kind")?;
        self.require(Recorded::FORMAT, "texture format")?;
        self.require(Recorded::FILTER, "texture filter")?;

        if self.format.is_compressed() {
            if !E::SUPPORTS_COMPRESSION {
                return Err(TextureError::CompressionUnsupported { kind: E::KIND }.into());
            }
            if extent.min_side() < 4 {
                return Err(TextureError::TooSmallForCompression.into());
            }
        }
        if self.filter.mipmaps && !extent.sides_power_of_two() {
            return Err(TextureError::NotPowerOfTwo.into());
        }

        self.extent = extent;
        self.recorded.insert(Recorded::DIMENSIONS);
        if self.kind != TextureKind::Attachment {
            let total = self.total_byte_size();
            self.data.resize(total, 0);
        }
        Ok(())
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn wrap(&self) -> Option<E::Wrap> {
        self.wrap
    }

    pub fn border(&self) -> Option<Color> {
        self.border
    }

    pub fn dimensions(&self) -> E {
        self.extent
    }

    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    pub fn is_compressed(&self) -> bool {
        self.format.is_compressed()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mip levels implied by the filter: the full chain down to 1x1 when
    /// mipmaps are requested (block formats stop at 4x4), otherwise 1.
    pub fn levels(&self) -> usize {
        if !self.filter.mipmaps {
            return 1;
        }
        let side = self.extent.max_side().max(1);
        let count = side.ilog2() as usize + 1;
        if self.format.is_compressed() {
            count.saturating_sub(2).max(1)
        } else {
            count
        }
    }

    /// Placement of `level`, derived by walking the level size series.
    pub fn info_for_level(&self, level: usize) -> Result<LevelInfo<E>, TextureError> {
        let levels = self.levels();
        if level >= levels {
            return Err(TextureError::LevelOutOfRange { level, levels });
        }
        let mut dimensions = self.extent;
        let mut offset = 0;
        for _ in 0..level {
            offset += level_byte_size(&dimensions, self.format);
            dimensions = dimensions.halved();
        }
        Ok(LevelInfo {
            offset,
            size: level_byte_size(&dimensions, self.format),
            dimensions,
        })
    }

    /// Bytes of the whole mip chain.
    pub fn total_byte_size(&self) -> usize {
        let mut dimensions = self.extent;
        let mut total = 0;
        for _ in 0..self.levels() {
            total += level_byte_size(&dimensions, self.format);
            dimensions = dimensions.halved();
        }
        total
    }

    fn store(&self) -> Result<(), TextureError> {
        if self.kind == TextureKind::Attachment {
            return Err(TextureError::NoStore);
        }
        if self.life == LifeState::Ready && self.kind == TextureKind::Static {
            return Err(TextureError::Sealed);
        }
        Ok(())
    }

    /// Replace the full contents of `level` (all faces for cubes).
    pub fn write(&mut self, data: &[u8], level: usize) -> Result<(), TextureError> {
        self.store()?;
        let info = self.info_for_level(level)?;
        if data.len() != info.size {
            return Err(TextureError::WrongLevelSize {
                len: data.len(),
                expected: info.size,
            });
        }
        self.data[info.offset..info.offset + info.size].copy_from_slice(data);
        Ok(())
    }

    /// Expose the bytes of `level` for writing.
    pub fn map(&mut self, level: usize) -> Result<&mut [u8], TextureError> {
        self.store()?;
        let info = self.info_for_level(level)?;
        Ok(&mut self.data[info.offset..info.offset + info.size])
    }

    /// Check the description is complete.
    pub fn validate(&self) -> Result<(), FrontendError> {
        self.require(Recorded::KIND, "texture kind")?;
        self.require(Recorded::FORMAT, "texture format")?;
        self.require(Recorded::FILTER, "texture filter")?;
        self.require(Recorded::WRAP, "texture wrap")?;
        self.require(Recorded::DIMENSIONS, "texture dimensions")?;
        if let Some(wrap) = &self.wrap {
            if wrap.clamps_to_border() && self.border.is_none() {
                return Err(TextureError::MissingBorder.into());
            }
        }
        Ok(())
    }

    pub(crate) fn life(&self) -> LifeState {
        self.life
    }

    pub(crate) fn set_life(&mut self, life: LifeState) {
        self.life = life;
    }
}

impl TextureCube {
    /// Replace the contents of one `face` of `level`.
    pub fn write_face(
        &mut self,
        data: &[u8],
        face: CubeFace,
        level: usize,
    ) -> Result<(), TextureError> {
        self.store()?;
        let info = self.info_for_level(level)?;
        let face_size = info.size / 6;
        if data.len() != face_size {
            return Err(TextureError::WrongLevelSize {
                len: data.len(),
                expected: face_size,
            });
        }
        let offset = info.offset + face_size * face.index();
        self.data[offset..offset + face_size].copy_from_slice(data);
        Ok(())
    }

    /// Expose the bytes of one `face` of `level` for writing.
    pub fn map_face(&mut self, level: usize, face: CubeFace) -> Result<&mut [u8], TextureError> {
        self.store()?;
        let info = self.info_for_level(level)?;
        let face_size = info.size / 6;
        let offset = info.offset + face_size * face.index();
        Ok(&mut self.data[offset..offset + face_size])
    }
}

impl<E: Extent> PoolItem for Texture<E> {
    const KIND: ResourceKind = E::KIND;

    fn byte_usage(&self) -> usize {
        if self.recorded.contains(Recorded::DIMENSIONS) {
            // Attachments report chain size too; the backend allocates it.
            self.total_byte_size()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texture2d(kind: TextureKind, format: Format, filter: Filter) -> Texture2D {
        let mut texture = Texture2D::default();
        texture.record_kind(kind).unwrap();
        texture.record_format(format).unwrap();
        texture.record_filter(filter).unwrap();
        texture
    }

    #[test]
    fn dimensions_require_prior_shape_fields() {
        let mut texture = Texture2D::default();
        texture.record_kind(TextureKind::Static).unwrap();
        assert_eq!(
            texture.record_dimensions(Extent2D {
                width: 4,
                height: 4
            }),
            Err(FrontendError::Record(RecordError::Missing {
                field: "texture format"
            }))
        );
    }

    #[test]
    fn dimensions_record_once() {
        let mut texture = texture2d(TextureKind::Static, Format::RgbaU8, Filter::default());
        texture
            .record_dimensions(Extent2D {
                width: 8,
                height: 8,
            })
            .unwrap();
        assert_eq!(
            texture.record_dimensions(Extent2D {
                width: 16,
                height: 16,
            }),
            Err(FrontendError::Record(RecordError::AlreadyRecorded {
                field: "texture dimensions"
            }))
        );
    }

    #[test]
    fn compressed_formats_rejected_for_1d() {
        let mut texture = Texture1D::default();
        texture.record_kind(TextureKind::Static).unwrap();
        texture.record_format(Format::Dxt1).unwrap();
        texture.record_filter(Filter::default()).unwrap();
        assert_eq!(
            texture.record_dimensions(Extent1D { width: 16 }),
            Err(FrontendError::Texture(TextureError::CompressionUnsupported {
                kind: ResourceKind::Texture1D
            }))
        );
    }

    #[test]
    fn compressed_formats_need_four_pixel_sides() {
        let mut texture = texture2d(TextureKind::Static, Format::Dxt5, Filter::default());
        assert_eq!(
            texture.record_dimensions(Extent2D {
                width: 2,
                height: 8,
            }),
            Err(FrontendError::Texture(TextureError::TooSmallForCompression))
        );
    }

    #[test]
    fn mipmaps_need_power_of_two_sides() {
        let filter = Filter {
            bilinear: true,
            trilinear: false,
            mipmaps: true,
        };
        let mut texture = texture2d(TextureKind::Static, Format::RgbaU8, filter);
        assert_eq!(
            texture.record_dimensions(Extent2D {
                width: 24,
                height: 24,
            }),
            Err(FrontendError::Texture(TextureError::NotPowerOfTwo))
        );
        texture = texture2d(TextureKind::Static, Format::RgbaU8, filter);
        texture
            .record_dimensions(Extent2D {
                width: 32,
                height: 32,
            })
            .unwrap();
        assert_eq!(texture.levels(), 6);
    }

    #[test]
    fn level_count_follows_filter_and_compression() {
        let mipmapped = Filter {
            bilinear: true,
            trilinear: true,
            mipmaps: true,
        };
        let mut plain = texture2d(TextureKind::Static, Format::RgbaU8, Filter::default());
        plain
            .record_dimensions(Extent2D {
                width: 256,
                height: 256,
            })
            .unwrap();
        assert_eq!(plain.levels(), 1);

        let mut chained = texture2d(TextureKind::Static, Format::RgbaU8, mipmapped);
        chained
            .record_dimensions(Extent2D {
                width: 256,
                height: 256,
            })
            .unwrap();
        assert_eq!(chained.levels(), 9);

        // Block formats stop the chain at 4x4.
        let mut compressed = texture2d(TextureKind::Static, Format::Dxt1, mipmapped);
        compressed
            .record_dimensions(Extent2D {
                width: 256,
                height: 256,
            })
            .unwrap();
        assert_eq!(compressed.levels(), 7);
    }

    #[test]
    fn level_offsets_follow_the_geometric_series() {
        let mut texture = texture2d(
            TextureKind::Static,
            Format::RgbaU8,
            Filter {
                bilinear: true,
                trilinear: false,
                mipmaps: true,
            },
        );
        texture
            .record_dimensions(Extent2D {
                width: 16,
                height: 16,
            })
            .unwrap();
        assert_eq!(texture.levels(), 5);

        let mut expected_offset = 0;
        let mut side = 16_usize;
        for level in 0..texture.levels() {
            let info = texture.info_for_level(level).unwrap();
            assert_eq!(info.offset, expected_offset);
            assert_eq!(info.size, side * side * 4);
            assert_eq!(
                info.dimensions,
                Extent2D {
                    width: side,
                    height: side,
                }
            );
            expected_offset += info.size;
            side = (side / 2).max(1);
        }
        assert_eq!(texture.total_byte_size(), expected_offset);
        assert_eq!(texture.data().len(), expected_offset);
        assert!(matches!(
            texture.info_for_level(5),
            Err(TextureError::LevelOutOfRange {
                level: 5,
                levels: 5,
            })
        ));
    }

    #[test]
    fn compressed_level_sizes_count_blocks() {
        let mut texture = texture2d(TextureKind::Static, Format::Dxt1, Filter::default());
        texture
            .record_dimensions(Extent2D {
                width: 8,
                height: 8,
            })
            .unwrap();
        // 2x2 blocks of 8 bytes each.
        assert_eq!(texture.info_for_level(0).unwrap().size, 32);

        let mut wide = texture2d(TextureKind::Static, Format::Dxt5, Filter::default());
        wide.record_dimensions(Extent2D {
            width: 10,
            height: 6,
        })
        .unwrap();
        // ceil(10/4) x ceil(6/4) = 3x2 blocks of 16 bytes each.
        assert_eq!(wide.info_for_level(0).unwrap().size, 96);
    }

    #[test]
    fn writes_fill_exactly_one_level() {
        let mut texture = texture2d(
            TextureKind::Dynamic,
            Format::RU8,
            Filter {
                bilinear: false,
                trilinear: false,
                mipmaps: true,
            },
        );
        texture
            .record_dimensions(Extent2D {
                width: 4,
                height: 4,
            })
            .unwrap();
        assert_eq!(
            texture.write(&[1; 3], 0),
            Err(TextureError::WrongLevelSize {
                len: 3,
                expected: 16,
            })
        );
        texture.write(&[7; 16], 0).unwrap();
        texture.write(&[9; 4], 1).unwrap();
        assert_eq!(&texture.data()[..16], &[7; 16]);
        assert_eq!(&texture.data()[16..20], &[9; 4]);
    }

    #[test]
    fn attachments_have_no_store_but_report_usage() {
        let mut texture = texture2d(TextureKind::Attachment, Format::D24S8, Filter::default());
        texture
            .record_dimensions(Extent2D {
                width: 256,
                height: 256,
            })
            .unwrap();
        assert_eq!(texture.data().len(), 0);
        assert_eq!(texture.byte_usage(), 256 * 256 * 4);
        assert_eq!(texture.write(&[0; 4], 0), Err(TextureError::NoStore));
    }

    #[test]
    fn static_textures_seal_after_ready() {
        let mut texture = texture2d(TextureKind::Static, Format::RU8, Filter::default());
        texture
            .record_dimensions(Extent2D {
                width: 2,
                height: 2,
            })
            .unwrap();
        texture.write(&[1, 2, 3, 4], 0).unwrap();
        texture.set_life(LifeState::Ready);
        assert_eq!(texture.write(&[5, 6, 7, 8], 0), Err(TextureError::Sealed));
        assert!(texture.map(0).is_err());
    }

    #[test]
    fn cube_faces_pack_in_face_order() {
        let mut cube = TextureCube::default();
        cube.record_kind(TextureKind::Static).unwrap();
        cube.record_format(Format::RgbaU8).unwrap();
        cube.record_filter(Filter::default()).unwrap();
        cube.record_dimensions(ExtentCube {
            width: 4,
            height: 4,
        })
        .unwrap();

        let level = cube.info_for_level(0).unwrap();
        assert_eq!(level.size, 4 * 4 * 4 * 6);
        let face_size = level.size / 6;

        cube.write_face(&vec![0xCC; face_size], CubeFace::Back, 0)
            .unwrap();
        let start = face_size * CubeFace::Back.index();
        assert_eq!(&cube.data()[start..start + face_size], &vec![0xCC; face_size][..]);
        assert_eq!(
            cube.write_face(&[0; 1], CubeFace::Top, 0),
            Err(TextureError::WrongLevelSize {
                len: 1,
                expected: face_size,
            })
        );

        let mapped = cube.map_face(0, CubeFace::Left).unwrap();
        mapped.fill(0x11);
        assert_eq!(&cube.data()[face_size..face_size * 2], &vec![0x11; face_size][..]);
    }

    #[test]
    fn border_color_required_when_clamping_to_border() {
        let mut texture = texture2d(TextureKind::Static, Format::RgbaU8, Filter::default());
        texture
            .record_wrap(Wrap2D {
                s: Wrap::ClampToBorder,
                t: Wrap::Repeat,
            })
            .unwrap();
        texture
            .record_dimensions(Extent2D {
                width: 2,
                height: 2,
            })
            .unwrap();
        assert_eq!(
            texture.validate(),
            Err(FrontendError::Texture(TextureError::MissingBorder))
        );
        texture.record_border(Color::TRANSPARENT_BLACK).unwrap();
        texture.validate().unwrap();
    }

    #[test]
    fn validate_requires_wrap() {
        let mut texture = texture2d(TextureKind::Static, Format::RU8, Filter::default());
        texture
            .record_dimensions(Extent2D {
                width: 2,
                height: 2,
            })
            .unwrap();
        assert_eq!(
            texture.validate(),
            Err(FrontendError::Record(RecordError::Missing {
                field: "texture wrap"
            }))
        );
    }
}
