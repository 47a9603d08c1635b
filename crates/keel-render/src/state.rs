//! Pipeline state, diffed by hash.
//!
//! Each state group caches a hash of its fields with the most significant bit
//! reserved as a dirty marker. Recording a value marks the group dirty;
//! [`flush`](ScissorState::flush) recomputes the hash and clears the marker.
//! Equality first rejects on the cached hashes, then confirms field by field,
//! so comparing the state of consecutive draws stays cheap for a backend.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const DIRTY_BIT: u64 = 1 << 63;

fn finish(hasher: DefaultHasher) -> u64 {
    hasher.finish() & !DIRTY_BIT
}

/// Scissor test.
#[derive(Clone, Copy, Debug)]
pub struct ScissorState {
    hash: u64,
    enabled: bool,
    offset: [i32; 2],
    size: [i32; 2],
}

impl ScissorState {
    pub fn record_enable(&mut self, enable: bool) {
        self.enabled = enable;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_offset(&mut self, offset: [i32; 2]) {
        self.offset = offset;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_size(&mut self, size: [i32; 2]) {
        self.size = size;
        self.hash |= DIRTY_BIT;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn offset(&self) -> [i32; 2] {
        self.offset
    }

    pub fn size(&self) -> [i32; 2] {
        self.size
    }

    pub fn flush(&mut self) {
        if self.hash & DIRTY_BIT == 0 {
            return;
        }
        let mut hasher = DefaultHasher::new();
        self.enabled.hash(&mut hasher);
        self.offset.hash(&mut hasher);
        self.size.hash(&mut hasher);
        self.hash = finish(hasher);
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn is_dirty(&self) -> bool {
        self.hash & DIRTY_BIT != 0
    }
}

impl Default for ScissorState {
    fn default() -> Self {
        let mut state = Self {
            hash: DIRTY_BIT,
            enabled: false,
            offset: [0, 0],
            size: [0, 0],
        };
        state.flush();
        state
    }
}

impl PartialEq for ScissorState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            !self.is_dirty() && !other.is_dirty(),
            "compared unflushed scissor state"
        );
        if self.hash != other.hash {
            return false;
        }
        self.enabled == other.enabled && self.offset == other.offset && self.size == other.size
    }
}

impl Eq for ScissorState {}

/// Source or destination blend factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FactorKind {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

/// Blending.
#[derive(Clone, Copy, Debug)]
pub struct BlendState {
    hash: u64,
    color_src_factor: FactorKind,
    color_dst_factor: FactorKind,
    alpha_src_factor: FactorKind,
    alpha_dst_factor: FactorKind,
    write_mask: u8,
    enabled: bool,
}

impl BlendState {
    /// Write mask with all four channels enabled.
    pub const MASK_ALL: u8 = 0b1111;

    pub fn record_enable(&mut self, enable: bool) {
        self.enabled = enable;
        self.hash |= DIRTY_BIT;
    }

    /// Record the same factors for the color and alpha equations.
    pub fn record_blend_factors(&mut self, src: FactorKind, dst: FactorKind) {
        self.record_color_blend_factors(src, dst);
        self.record_alpha_blend_factors(src, dst);
    }

    pub fn record_color_blend_factors(&mut self, src: FactorKind, dst: FactorKind) {
        self.color_src_factor = src;
        self.color_dst_factor = dst;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_alpha_blend_factors(&mut self, src: FactorKind, dst: FactorKind) {
        self.alpha_src_factor = src;
        self.alpha_dst_factor = dst;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_write_mask(&mut self, write_mask: u8) {
        self.write_mask = write_mask;
        self.hash |= DIRTY_BIT;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn color_src_factor(&self) -> FactorKind {
        self.color_src_factor
    }

    pub fn color_dst_factor(&self) -> FactorKind {
        self.color_dst_factor
    }

    pub fn alpha_src_factor(&self) -> FactorKind {
        self.alpha_src_factor
    }

    pub fn alpha_dst_factor(&self) -> FactorKind {
        self.alpha_dst_factor
    }

    pub fn write_mask(&self) -> u8 {
        self.write_mask
    }

    pub fn flush(&mut self) {
        if self.hash & DIRTY_BIT == 0 {
            return;
        }
        let mut hasher = DefaultHasher::new();
        self.color_src_factor.hash(&mut hasher);
        self.color_dst_factor.hash(&mut hasher);
        self.alpha_src_factor.hash(&mut hasher);
        self.alpha_dst_factor.hash(&mut hasher);
        self.write_mask.hash(&mut hasher);
        self.enabled.hash(&mut hasher);
        self.hash = finish(hasher);
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn is_dirty(&self) -> bool {
        self.hash & DIRTY_BIT != 0
    }
}

impl Default for BlendState {
    fn default() -> Self {
        let mut state = Self {
            hash: DIRTY_BIT,
            color_src_factor: FactorKind::One,
            color_dst_factor: FactorKind::Zero,
            alpha_src_factor: FactorKind::One,
            alpha_dst_factor: FactorKind::Zero,
            write_mask: Self::MASK_ALL,
            enabled: false,
        };
        state.flush();
        state
    }
}

impl PartialEq for BlendState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            !self.is_dirty() && !other.is_dirty(),
            "compared unflushed blend state"
        );
        if self.hash != other.hash {
            return false;
        }
        self.color_src_factor == other.color_src_factor
            && self.color_dst_factor == other.color_dst_factor
            && self.alpha_src_factor == other.alpha_src_factor
            && self.alpha_dst_factor == other.alpha_dst_factor
            && self.write_mask == other.write_mask
            && self.enabled == other.enabled
    }
}

impl Eq for BlendState {}

/// Depth test and write.
#[derive(Clone, Copy, Debug)]
pub struct DepthState {
    hash: u64,
    test: bool,
    write: bool,
}

impl DepthState {
    pub fn record_test(&mut self, test: bool) {
        self.test = test;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_write(&mut self, write: bool) {
        self.write = write;
        self.hash |= DIRTY_BIT;
    }

    pub fn test(&self) -> bool {
        self.test
    }

    pub fn write(&self) -> bool {
        self.write
    }

    pub fn flush(&mut self) {
        if self.hash & DIRTY_BIT == 0 {
            return;
        }
        let mut hasher = DefaultHasher::new();
        self.test.hash(&mut hasher);
        self.write.hash(&mut hasher);
        self.hash = finish(hasher);
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn is_dirty(&self) -> bool {
        self.hash & DIRTY_BIT != 0
    }
}

impl Default for DepthState {
    fn default() -> Self {
        let mut state = Self {
            hash: DIRTY_BIT,
            test: false,
            write: false,
        };
        state.flush();
        state
    }
}

impl PartialEq for DepthState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            !self.is_dirty() && !other.is_dirty(),
            "compared unflushed depth state"
        );
        if self.hash != other.hash {
            return false;
        }
        self.test == other.test && self.write == other.write
    }
}

impl Eq for DepthState {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrontFaceKind {
    ClockWise,
    CounterClockWise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullFaceKind {
    Front,
    Back,
}

/// Face culling. Enabled by default, culling back faces.
#[derive(Clone, Copy, Debug)]
pub struct CullState {
    hash: u64,
    front_face: FrontFaceKind,
    cull_face: CullFaceKind,
    enabled: bool,
}

impl CullState {
    pub fn record_enable(&mut self, enable: bool) {
        self.enabled = enable;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_front_face(&mut self, front_face: FrontFaceKind) {
        self.front_face = front_face;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_cull_face(&mut self, cull_face: CullFaceKind) {
        self.cull_face = cull_face;
        self.hash |= DIRTY_BIT;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn front_face(&self) -> FrontFaceKind {
        self.front_face
    }

    pub fn cull_face(&self) -> CullFaceKind {
        self.cull_face
    }

    pub fn flush(&mut self) {
        if self.hash & DIRTY_BIT == 0 {
            return;
        }
        let mut hasher = DefaultHasher::new();
        self.front_face.hash(&mut hasher);
        self.cull_face.hash(&mut hasher);
        self.enabled.hash(&mut hasher);
        self.hash = finish(hasher);
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn is_dirty(&self) -> bool {
        self.hash & DIRTY_BIT != 0
    }
}

impl Default for CullState {
    fn default() -> Self {
        let mut state = Self {
            hash: DIRTY_BIT,
            front_face: FrontFaceKind::ClockWise,
            cull_face: CullFaceKind::Back,
            enabled: true,
        };
        state.flush();
        state
    }
}

impl PartialEq for CullState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            !self.is_dirty() && !other.is_dirty(),
            "compared unflushed cull state"
        );
        if self.hash != other.hash {
            return false;
        }
        self.front_face == other.front_face
            && self.cull_face == other.cull_face
            && self.enabled == other.enabled
    }
}

impl Eq for CullState {}

/// Stencil comparison function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Never,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Always,
}

/// Action applied to a stencil value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

/// Stencil test, with separate front and back face actions.
#[derive(Clone, Copy, Debug)]
pub struct StencilState {
    hash: u64,
    write_mask: u8,
    function: FunctionKind,
    reference: u8,
    mask: u8,
    front_fail_action: OperationKind,
    front_depth_fail_action: OperationKind,
    front_depth_pass_action: OperationKind,
    back_fail_action: OperationKind,
    back_depth_fail_action: OperationKind,
    back_depth_pass_action: OperationKind,
    enabled: bool,
}

impl StencilState {
    pub fn record_enable(&mut self, enable: bool) {
        self.enabled = enable;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_write_mask(&mut self, write_mask: u8) {
        self.write_mask = write_mask;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_function(&mut self, function: FunctionKind) {
        self.function = function;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_reference(&mut self, reference: u8) {
        self.reference = reference;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_mask(&mut self, mask: u8) {
        self.mask = mask;
        self.hash |= DIRTY_BIT;
    }

    /// Record `action` for stencil failure on both faces.
    pub fn record_fail_action(&mut self, action: OperationKind) {
        self.record_front_fail_action(action);
        self.record_back_fail_action(action);
    }

    /// Record `action` for depth failure on both faces.
    pub fn record_depth_fail_action(&mut self, action: OperationKind) {
        self.record_front_depth_fail_action(action);
        self.record_back_depth_fail_action(action);
    }

    /// Record `action` for depth pass on both faces.
    pub fn record_depth_pass_action(&mut self, action: OperationKind) {
        self.record_front_depth_pass_action(action);
        self.record_back_depth_pass_action(action);
    }

    pub fn record_front_fail_action(&mut self, action: OperationKind) {
        self.front_fail_action = action;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_front_depth_fail_action(&mut self, action: OperationKind) {
        self.front_depth_fail_action = action;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_front_depth_pass_action(&mut self, action: OperationKind) {
        self.front_depth_pass_action = action;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_back_fail_action(&mut self, action: OperationKind) {
        self.back_fail_action = action;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_back_depth_fail_action(&mut self, action: OperationKind) {
        self.back_depth_fail_action = action;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_back_depth_pass_action(&mut self, action: OperationKind) {
        self.back_depth_pass_action = action;
        self.hash |= DIRTY_BIT;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn write_mask(&self) -> u8 {
        self.write_mask
    }

    pub fn function(&self) -> FunctionKind {
        self.function
    }

    pub fn reference(&self) -> u8 {
        self.reference
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn front_fail_action(&self) -> OperationKind {
        self.front_fail_action
    }

    pub fn front_depth_fail_action(&self) -> OperationKind {
        self.front_depth_fail_action
    }

    pub fn front_depth_pass_action(&self) -> OperationKind {
        self.front_depth_pass_action
    }

    pub fn back_fail_action(&self) -> OperationKind {
        self.back_fail_action
    }

    pub fn back_depth_fail_action(&self) -> OperationKind {
        self.back_depth_fail_action
    }

    pub fn back_depth_pass_action(&self) -> OperationKind {
        self.back_depth_pass_action
    }

    pub fn flush(&mut self) {
        if self.hash & DIRTY_BIT == 0 {
            return;
        }
        let mut hasher = DefaultHasher::new();
        self.write_mask.hash(&mut hasher);
        self.function.hash(&mut hasher);
        self.reference.hash(&mut hasher);
        self.mask.hash(&mut hasher);
        self.front_fail_action.hash(&mut hasher);
        self.front_depth_fail_action.hash(&mut hasher);
        self.front_depth_pass_action.hash(&mut hasher);
        self.back_fail_action.hash(&mut hasher);
        self.back_depth_fail_action.hash(&mut hasher);
        self.back_depth_pass_action.hash(&mut hasher);
        self.enabled.hash(&mut hasher);
        self.hash = finish(hasher);
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn is_dirty(&self) -> bool {
        self.hash & DIRTY_BIT != 0
    }
}

impl Default for StencilState {
    fn default() -> Self {
        let mut state = Self {
            hash: DIRTY_BIT,
            write_mask: 0xff,
            function: FunctionKind::Always,
            reference: 0,
            mask: 0xff,
            front_fail_action: OperationKind::Keep,
            front_depth_fail_action: OperationKind::Keep,
            front_depth_pass_action: OperationKind::Keep,
            back_fail_action: OperationKind::Keep,
            back_depth_fail_action: OperationKind::Keep,
            back_depth_pass_action: OperationKind::Keep,
            enabled: false,
        };
        state.flush();
        state
    }
}

impl PartialEq for StencilState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            !self.is_dirty() && !other.is_dirty(),
            "compared unflushed stencil state"
        );
        if self.hash != other.hash {
            return false;
        }
        self.write_mask == other.write_mask
            && self.function == other.function
            && self.reference == other.reference
            && self.mask == other.mask
            && self.front_fail_action == other.front_fail_action
            && self.front_depth_fail_action == other.front_depth_fail_action
            && self.front_depth_pass_action == other.front_depth_pass_action
            && self.back_fail_action == other.back_fail_action
            && self.back_depth_fail_action == other.back_depth_fail_action
            && self.back_depth_pass_action == other.back_depth_pass_action
            && self.enabled == other.enabled
    }
}

impl Eq for StencilState {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Point,
    Line,
    Fill,
}

/// Polygon rasterization mode.
#[derive(Clone, Copy, Debug)]
pub struct PolygonState {
    hash: u64,
    mode: ModeKind,
}

impl PolygonState {
    pub fn record_mode(&mut self, mode: ModeKind) {
        self.mode = mode;
        self.hash |= DIRTY_BIT;
    }

    pub fn mode(&self) -> ModeKind {
        self.mode
    }

    pub fn flush(&mut self) {
        if self.hash & DIRTY_BIT == 0 {
            return;
        }
        let mut hasher = DefaultHasher::new();
        self.mode.hash(&mut hasher);
        self.hash = finish(hasher);
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn is_dirty(&self) -> bool {
        self.hash & DIRTY_BIT != 0
    }
}

impl Default for PolygonState {
    fn default() -> Self {
        let mut state = Self {
            hash: DIRTY_BIT,
            mode: ModeKind::Fill,
        };
        state.flush();
        state
    }
}

impl PartialEq for PolygonState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            !self.is_dirty() && !other.is_dirty(),
            "compared unflushed polygon state"
        );
        if self.hash != other.hash {
            return false;
        }
        self.mode == other.mode
    }
}

impl Eq for PolygonState {}

/// Viewport rectangle.
#[derive(Clone, Copy, Debug)]
pub struct ViewportState {
    hash: u64,
    offset: [i32; 2],
    dimensions: [u32; 2],
}

impl ViewportState {
    pub fn record_offset(&mut self, offset: [i32; 2]) {
        self.offset = offset;
        self.hash |= DIRTY_BIT;
    }

    pub fn record_dimensions(&mut self, dimensions: [u32; 2]) {
        self.dimensions = dimensions;
        self.hash |= DIRTY_BIT;
    }

    pub fn offset(&self) -> [i32; 2] {
        self.offset
    }

    pub fn dimensions(&self) -> [u32; 2] {
        self.dimensions
    }

    pub fn flush(&mut self) {
        if self.hash & DIRTY_BIT == 0 {
            return;
        }
        let mut hasher = DefaultHasher::new();
        self.offset.hash(&mut hasher);
        self.dimensions.hash(&mut hasher);
        self.hash = finish(hasher);
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn is_dirty(&self) -> bool {
        self.hash & DIRTY_BIT != 0
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        let mut state = Self {
            hash: DIRTY_BIT,
            offset: [0, 0],
            dimensions: [0, 0],
        };
        state.flush();
        state
    }
}

impl PartialEq for ViewportState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            !self.is_dirty() && !other.is_dirty(),
            "compared unflushed viewport state"
        );
        if self.hash != other.hash {
            return false;
        }
        self.offset == other.offset && self.dimensions == other.dimensions
    }
}

impl Eq for ViewportState {}

/// Complete pipeline state for a draw.
///
/// Groups are mutated directly; [`State::flush`] re-derives the combined hash
/// unconditionally, so it is always safe to call before comparing.
#[derive(Clone, Copy, Debug)]
pub struct State {
    pub scissor: ScissorState,
    pub blend: BlendState,
    pub depth: DepthState,
    pub cull: CullState,
    pub stencil: StencilState,
    pub polygon: PolygonState,
    pub viewport: ViewportState,
    hash: u64,
}

impl State {
    pub fn flush(&mut self) {
        self.scissor.flush();
        self.blend.flush();
        self.depth.flush();
        self.cull.flush();
        self.stencil.flush();
        self.polygon.flush();
        self.viewport.flush();
        let mut hasher = DefaultHasher::new();
        self.scissor.hash().hash(&mut hasher);
        self.blend.hash().hash(&mut hasher);
        self.depth.hash().hash(&mut hasher);
        self.cull.hash().hash(&mut hasher);
        self.stencil.hash().hash(&mut hasher);
        self.polygon.hash().hash(&mut hasher);
        self.viewport.hash().hash(&mut hasher);
        self.hash = hasher.finish();
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl Default for State {
    fn default() -> Self {
        let mut state = Self {
            scissor: ScissorState::default(),
            blend: BlendState::default(),
            depth: DepthState::default(),
            cull: CullState::default(),
            stencil: StencilState::default(),
            polygon: PolygonState::default(),
            viewport: ViewportState::default(),
            hash: 0,
        };
        state.flush();
        state
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        // Ordered by how often groups differ between consecutive draws.
        self.cull == other.cull
            && self.depth == other.depth
            && self.blend == other.blend
            && self.polygon == other.polygon
            && self.stencil == other.stencil
            && self.viewport == other.viewport
            && self.scissor == other.scissor
    }
}

impl Eq for State {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_flushed_and_equal() {
        let a = State::default();
        let b = State::default();
        assert!(!a.cull.is_dirty());
        assert!(a.cull.enabled());
        assert_eq!(a.cull.cull_face(), CullFaceKind::Back);
        assert_eq!(a.blend.write_mask(), BlendState::MASK_ALL);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn record_marks_dirty_until_flushed() {
        let mut depth = DepthState::default();
        depth.record_test(true);
        assert!(depth.is_dirty());
        depth.flush();
        assert!(!depth.is_dirty());
        assert!(depth.test());
    }

    #[test]
    fn flush_of_identical_fields_restores_equality() {
        let base = ScissorState::default();
        let mut probe = ScissorState::default();
        // Same value recorded again still dirties the hash.
        probe.record_enable(false);
        assert!(probe.is_dirty());
        probe.flush();
        assert_eq!(probe, base);
        assert_eq!(probe.hash(), base.hash());
    }

    #[test]
    fn differing_fields_compare_unequal() {
        let base = BlendState::default();
        let mut probe = BlendState::default();
        probe.record_blend_factors(FactorKind::SrcAlpha, FactorKind::OneMinusSrcAlpha);
        probe.flush();
        assert_ne!(probe, base);
        assert_eq!(probe.alpha_src_factor(), FactorKind::SrcAlpha);
        assert_eq!(probe.alpha_dst_factor(), FactorKind::OneMinusSrcAlpha);
    }

    #[test]
    fn alpha_dst_factor_participates_in_equality() {
        let base = BlendState::default();
        let mut probe = BlendState::default();
        probe.record_alpha_blend_factors(FactorKind::One, FactorKind::OneMinusSrcAlpha);
        probe.flush();
        assert_ne!(probe, base);
    }

    #[test]
    fn combined_fail_actions_apply_to_both_faces() {
        let mut stencil = StencilState::default();
        stencil.record_fail_action(OperationKind::Replace);
        stencil.record_depth_pass_action(OperationKind::IncrementWrap);
        stencil.flush();
        assert_eq!(stencil.front_fail_action(), OperationKind::Replace);
        assert_eq!(stencil.back_fail_action(), OperationKind::Replace);
        assert_eq!(stencil.front_depth_pass_action(), OperationKind::IncrementWrap);
        assert_eq!(stencil.back_depth_pass_action(), OperationKind::IncrementWrap);
    }

    #[test]
    fn state_hash_tracks_group_changes() {
        let mut state = State::default();
        let before = state.hash();
        state.viewport.record_dimensions([1920, 1080]);
        state.flush();
        assert_ne!(state.hash(), before);
        assert_ne!(state, State::default());

        let mut same = State::default();
        same.viewport.record_dimensions([1920, 1080]);
        same.flush();
        assert_eq!(state, same);
    }
}
