//! Render target descriptions.
//!
//! A target is either a swapchain surface or a bundle of attachments: at
//! most one depth and one stencil texture (a combined depth-stencil texture
//! fills both roles at once) plus an ordered list of color attachments. The
//! target records whether it owns its depth/stencil textures; owned
//! textures are destroyed with the target.

use crate::command::MAX_COLOR_ATTACHMENTS;
use crate::error::FrontendError;
use crate::pool::PoolItem;
use crate::resource::{LifeState, ResourceKind, Texture2DHandle};
use crate::texture::{Extent2D, Format};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    #[error("target already has a depth attachment")]
    DepthAlreadyAttached,
    #[error("target already has a stencil attachment")]
    StencilAlreadyAttached,
    #[error("separate depth and stencil attachments must share one combined texture")]
    SeparateDepthStencil,
    #[error("attachment format is not a {expected} format")]
    WrongFormat { expected: &'static str },
    #[error("attachment is {got_width}x{got_height} but the target is {width}x{height}")]
    DimensionMismatch {
        got_width: usize,
        got_height: usize,
        width: usize,
        height: usize,
    },
    #[error("swapchain targets and attachments are mutually exclusive")]
    SwapchainExclusive,
    #[error("target already holds {MAX_COLOR_ATTACHMENTS} color attachments")]
    ColorAttachmentsFull,
    #[error("no color attachment at index {index}")]
    NoAttachment { index: u8 },
    #[error("target has no attachments and is not a swapchain")]
    Empty,
    #[error("texture is not an attachment-kind texture")]
    NotAnAttachment,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct TargetFlags: u8 {
        const HAS_DEPTH = 1 << 0;
        const HAS_STENCIL = 1 << 1;
        const OWNS_DEPTH = 1 << 2;
        const OWNS_STENCIL = 1 << 3;
        const DIMENSIONS = 1 << 4;
        const SWAPCHAIN = 1 << 5;
    }
}

/// A render target description.
#[derive(Debug, Default)]
pub struct Target {
    life: LifeState,
    flags: TargetFlags,
    dimensions: Extent2D,
    depth: Option<Texture2DHandle>,
    stencil: Option<Texture2DHandle>,
    colors: Vec<Texture2DHandle>,
}

impl Target {
    fn fit_dimensions(&mut self, dimensions: Extent2D) -> Result<(), TargetError> {
        if self.flags.contains(TargetFlags::DIMENSIONS) {
            if dimensions != self.dimensions {
                return Err(TargetError::DimensionMismatch {
                    got_width: dimensions.width,
                    got_height: dimensions.height,
                    width: self.dimensions.width,
                    height: self.dimensions.height,
                });
            }
        } else {
            self.dimensions = dimensions;
            self.flags.insert(TargetFlags::DIMENSIONS);
        }
        Ok(())
    }

    fn attachable(&self) -> Result<(), TargetError> {
        if self.flags.contains(TargetFlags::SWAPCHAIN) {
            return Err(TargetError::SwapchainExclusive);
        }
        Ok(())
    }

    /// Mark this target as the presentable surface. Must come before any
    /// attachment.
    pub fn record_swapchain(&mut self, dimensions: Extent2D) -> Result<(), TargetError> {
        if !self.flags.is_empty() || !self.colors.is_empty() {
            return Err(TargetError::SwapchainExclusive);
        }
        self.dimensions = dimensions;
        self.flags.insert(TargetFlags::SWAPCHAIN | TargetFlags::DIMENSIONS);
        Ok(())
    }

    /// Attach a depth-only texture. `owned` records that the target must
    /// destroy the texture with itself.
    pub fn attach_depth(
        &mut self,
        texture: Texture2DHandle,
        format: Format,
        dimensions: Extent2D,
        owned: bool,
    ) -> Result<(), TargetError> {
        self.attachable()?;
        if self.flags.contains(TargetFlags::HAS_DEPTH) {
            return Err(TargetError::DepthAlreadyAttached);
        }
        if self.flags.contains(TargetFlags::HAS_STENCIL) {
            return Err(TargetError::SeparateDepthStencil);
        }
        if !format.is_depth_only() {
            return Err(TargetError::WrongFormat { expected: "depth" });
        }
        self.fit_dimensions(dimensions)?;
        self.depth = Some(texture);
        self.flags.insert(TargetFlags::HAS_DEPTH);
        if owned {
            self.flags.insert(TargetFlags::OWNS_DEPTH);
        }
        Ok(())
    }

    /// Attach a stencil-only texture.
    pub fn attach_stencil(
        &mut self,
        texture: Texture2DHandle,
        format: Format,
        dimensions: Extent2D,
        owned: bool,
    ) -> Result<(), TargetError> {
        self.attachable()?;
        if self.flags.contains(TargetFlags::HAS_STENCIL) {
            return Err(TargetError::StencilAlreadyAttached);
        }
        if self.flags.contains(TargetFlags::HAS_DEPTH) {
            return Err(TargetError::SeparateDepthStencil);
        }
        if !format.is_stencil_only() {
            return Err(TargetError::WrongFormat { expected: "stencil" });
        }
        self.fit_dimensions(dimensions)?;
        self.stencil = Some(texture);
        self.flags.insert(TargetFlags::HAS_STENCIL);
        if owned {
            self.flags.insert(TargetFlags::OWNS_STENCIL);
        }
        Ok(())
    }

    /// Attach one combined depth-stencil texture filling both roles.
    pub fn attach_depth_stencil(
        &mut self,
        texture: Texture2DHandle,
        format: Format,
        dimensions: Extent2D,
        owned: bool,
    ) -> Result<(), TargetError> {
        self.attachable()?;
        if self.flags.contains(TargetFlags::HAS_DEPTH) {
            return Err(TargetError::DepthAlreadyAttached);
        }
        if self.flags.contains(TargetFlags::HAS_STENCIL) {
            return Err(TargetError::StencilAlreadyAttached);
        }
        if !format.is_depth_stencil() {
            return Err(TargetError::WrongFormat {
                expected: "depth-stencil",
            });
        }
        self.fit_dimensions(dimensions)?;
        self.depth = Some(texture);
        self.stencil = Some(texture);
        self.flags
            .insert(TargetFlags::HAS_DEPTH | TargetFlags::HAS_STENCIL);
        if owned {
            self.flags
                .insert(TargetFlags::OWNS_DEPTH | TargetFlags::OWNS_STENCIL);
        }
        Ok(())
    }

    /// Append a color attachment.
    pub fn attach_color(
        &mut self,
        texture: Texture2DHandle,
        format: Format,
        dimensions: Extent2D,
    ) -> Result<(), TargetError> {
        self.attachable()?;
        if !format.is_color() {
            return Err(TargetError::WrongFormat { expected: "color" });
        }
        if self.colors.len() == MAX_COLOR_ATTACHMENTS {
            return Err(TargetError::ColorAttachmentsFull);
        }
        self.fit_dimensions(dimensions)?;
        self.colors.push(texture);
        Ok(())
    }

    pub fn is_swapchain(&self) -> bool {
        self.flags.contains(TargetFlags::SWAPCHAIN)
    }

    pub fn has_depth(&self) -> bool {
        self.flags.contains(TargetFlags::HAS_DEPTH)
    }

    pub fn has_stencil(&self) -> bool {
        self.flags.contains(TargetFlags::HAS_STENCIL)
    }

    pub fn owns_depth(&self) -> bool {
        self.flags.contains(TargetFlags::OWNS_DEPTH)
    }

    pub fn owns_stencil(&self) -> bool {
        self.flags.contains(TargetFlags::OWNS_STENCIL)
    }

    pub fn dimensions(&self) -> Extent2D {
        self.dimensions
    }

    pub fn depth_attachment(&self) -> Option<Texture2DHandle> {
        self.depth
    }

    pub fn stencil_attachment(&self) -> Option<Texture2DHandle> {
        self.stencil
    }

    pub fn color_attachments(&self) -> &[Texture2DHandle] {
        &self.colors
    }

    /// Whether `index` names a color store a command may write.
    ///
    /// Swapchain targets expose exactly one implicit store at index 0.
    pub fn has_color_attachment(&self, index: u8) -> bool {
        if self.is_swapchain() {
            index == 0
        } else {
            (index as usize) < self.colors.len()
        }
    }

    /// The owned depth/stencil textures to destroy with this target, the
    /// combined case reported once.
    pub(crate) fn owned_textures(&self) -> [Option<Texture2DHandle>; 2] {
        let depth = if self.owns_depth() { self.depth } else { None };
        let stencil = if self.owns_stencil() {
            self.stencil
        } else {
            None
        };
        if depth.is_some() && depth == stencil {
            [depth, None]
        } else {
            [depth, stencil]
        }
    }

    /// Check the target names something to render into.
    ///
    /// Dimensions are recorded by the first attachment (or the swapchain
    /// record), so an empty non-swapchain target is the only invalid shape.
    pub fn validate(&self) -> Result<(), FrontendError> {
        let empty = self.colors.is_empty() && self.depth.is_none() && self.stencil.is_none();
        if !self.is_swapchain() && empty {
            return Err(TargetError::Empty.into());
        }
        debug_assert!(self.flags.contains(TargetFlags::DIMENSIONS));
        Ok(())
    }

    pub(crate) fn life(&self) -> LifeState {
        self.life
    }

    pub(crate) fn set_life(&mut self, life: LifeState) {
        self.life = life;
    }
}

impl PoolItem for Target {
    const KIND: ResourceKind = ResourceKind::Target;

    /// A target holds only attachment handles; the attachment textures
    /// report their storage from their own pools.
    fn byte_usage(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: Extent2D = Extent2D {
        width: 256,
        height: 256,
    };

    #[test]
    fn depth_and_stencil_attach_at_most_once() {
        let mut target = Target::default();
        target
            .attach_depth(Texture2DHandle(0), Format::D24, DIMS, true)
            .unwrap();
        assert_eq!(
            target.attach_depth(Texture2DHandle(1), Format::D24, DIMS, true),
            Err(TargetError::DepthAlreadyAttached)
        );
        assert_eq!(
            target.attach_stencil(Texture2DHandle(1), Format::S8, DIMS, true),
            Err(TargetError::SeparateDepthStencil)
        );
    }

    #[test]
    fn combined_depth_stencil_fills_both_roles() {
        let mut target = Target::default();
        target
            .attach_depth_stencil(Texture2DHandle(3), Format::D24S8, DIMS, true)
            .unwrap();
        assert!(target.has_depth());
        assert!(target.has_stencil());
        assert_eq!(target.depth_attachment(), Some(Texture2DHandle(3)));
        assert_eq!(target.stencil_attachment(), Some(Texture2DHandle(3)));
        // The owned texture is reported once.
        assert_eq!(target.owned_textures(), [Some(Texture2DHandle(3)), None]);
    }

    #[test]
    fn externally_owned_attachments_are_not_reported() {
        let mut target = Target::default();
        target
            .attach_depth(Texture2DHandle(4), Format::D32, DIMS, false)
            .unwrap();
        assert!(!target.owns_depth());
        assert_eq!(target.owned_textures(), [None, None]);
    }

    #[test]
    fn attachment_formats_match_their_role() {
        let mut target = Target::default();
        assert_eq!(
            target.attach_depth(Texture2DHandle(0), Format::D24S8, DIMS, true),
            Err(TargetError::WrongFormat { expected: "depth" })
        );
        assert_eq!(
            target.attach_stencil(Texture2DHandle(0), Format::D24, DIMS, true),
            Err(TargetError::WrongFormat { expected: "stencil" })
        );
        assert_eq!(
            target.attach_depth_stencil(Texture2DHandle(0), Format::D32, DIMS, true),
            Err(TargetError::WrongFormat {
                expected: "depth-stencil"
            })
        );
        assert_eq!(
            target.attach_color(Texture2DHandle(0), Format::D24, DIMS),
            Err(TargetError::WrongFormat { expected: "color" })
        );
    }

    #[test]
    fn attachments_agree_on_dimensions() {
        let mut target = Target::default();
        target
            .attach_color(Texture2DHandle(0), Format::RgbaU8, DIMS)
            .unwrap();
        assert_eq!(
            target.attach_color(
                Texture2DHandle(1),
                Format::RgbaU8,
                Extent2D {
                    width: 128,
                    height: 128,
                },
            ),
            Err(TargetError::DimensionMismatch {
                got_width: 128,
                got_height: 128,
                width: 256,
                height: 256,
            })
        );
    }

    #[test]
    fn color_attachments_cap_at_eight() {
        let mut target = Target::default();
        for i in 0..MAX_COLOR_ATTACHMENTS {
            target
                .attach_color(Texture2DHandle(i as u32), Format::RgbaU8, DIMS)
                .unwrap();
        }
        assert_eq!(
            target.attach_color(Texture2DHandle(8), Format::RgbaU8, DIMS),
            Err(TargetError::ColorAttachmentsFull)
        );
        assert!(target.has_color_attachment(7));
        assert!(!target.has_color_attachment(8));
    }

    #[test]
    fn swapchain_excludes_attachments_both_ways() {
        let mut swapchain = Target::default();
        swapchain.record_swapchain(DIMS).unwrap();
        assert_eq!(
            swapchain.attach_color(Texture2DHandle(0), Format::RgbaU8, DIMS),
            Err(TargetError::SwapchainExclusive)
        );
        assert!(swapchain.has_color_attachment(0));
        assert!(!swapchain.has_color_attachment(1));
        swapchain.validate().unwrap();

        let mut attached = Target::default();
        attached
            .attach_color(Texture2DHandle(0), Format::RgbaU8, DIMS)
            .unwrap();
        assert_eq!(
            attached.record_swapchain(DIMS),
            Err(TargetError::SwapchainExclusive)
        );
    }

    #[test]
    fn validate_rejects_bare_targets() {
        let target = Target::default();
        assert_eq!(
            target.validate(),
            Err(FrontendError::Target(TargetError::Empty))
        );
    }

    #[test]
    fn attachment_bytes_belong_to_the_textures() {
        let mut target = Target::default();
        target
            .attach_depth_stencil(Texture2DHandle(0), Format::D24S8, DIMS, true)
            .unwrap();
        target
            .attach_color(Texture2DHandle(1), Format::RgbaU8, DIMS)
            .unwrap();
        assert_eq!(target.byte_usage(), 0);
    }
}
