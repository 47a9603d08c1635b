use std::fmt;

/// The seven pooled resource kinds managed by the frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Target,
    Program,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
}

impl ResourceKind {
    pub const COUNT: usize = 7;

    pub const ALL: [ResourceKind; Self::COUNT] = [
        ResourceKind::Buffer,
        ResourceKind::Target,
        ResourceKind::Program,
        ResourceKind::Texture1D,
        ResourceKind::Texture2D,
        ResourceKind::Texture3D,
        ResourceKind::TextureCube,
    ];

    /// Stable dense index, e.g. for per-kind stat arrays.
    pub fn index(self) -> usize {
        match self {
            ResourceKind::Buffer => 0,
            ResourceKind::Target => 1,
            ResourceKind::Program => 2,
            ResourceKind::Texture1D => 3,
            ResourceKind::Texture2D => 4,
            ResourceKind::Texture3D => 5,
            ResourceKind::TextureCube => 6,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Target => "target",
            ResourceKind::Program => "program",
            ResourceKind::Texture1D => "texture1D",
            ResourceKind::Texture2D => "texture2D",
            ResourceKind::Texture3D => "texture3D",
            ResourceKind::TextureCube => "textureCM",
        };
        f.write_str(name)
    }
}

/// Where a pooled slot sits between `create_*` and the `process()` that
/// finally releases it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LifeState {
    /// Slot reserved, record still being filled in.
    #[default]
    Allocated,
    /// Record validated and handed to the backend for construction.
    Ready,
    /// Destruction recorded; the slot is freed after the backend has seen
    /// the destroy command.
    PendingDestroy,
}

/// Handle to a pooled vertex/element buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Handle to a pooled render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u32);

/// Handle to a pooled shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Handle to a pooled 1D texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Texture1DHandle(pub u32);

/// Handle to a pooled 2D texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Texture2DHandle(pub u32);

/// Handle to a pooled 3D texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Texture3DHandle(pub u32);

/// Handle to a pooled cubemap texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureCubeHandle(pub u32);

/// A handle of any kind, as carried by resource lifecycle commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceRef {
    Buffer(BufferHandle),
    Target(TargetHandle),
    Program(ProgramHandle),
    Texture1D(Texture1DHandle),
    Texture2D(Texture2DHandle),
    Texture3D(Texture3DHandle),
    TextureCube(TextureCubeHandle),
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Buffer(_) => ResourceKind::Buffer,
            ResourceRef::Target(_) => ResourceKind::Target,
            ResourceRef::Program(_) => ResourceKind::Program,
            ResourceRef::Texture1D(_) => ResourceKind::Texture1D,
            ResourceRef::Texture2D(_) => ResourceKind::Texture2D,
            ResourceRef::Texture3D(_) => ResourceKind::Texture3D,
            ResourceRef::TextureCube(_) => ResourceKind::TextureCube,
        }
    }

    /// Slot index within the pool for this kind.
    pub fn index(&self) -> u32 {
        match self {
            ResourceRef::Buffer(h) => h.0,
            ResourceRef::Target(h) => h.0,
            ResourceRef::Program(h) => h.0,
            ResourceRef::Texture1D(h) => h.0,
            ResourceRef::Texture2D(h) => h.0,
            ResourceRef::Texture3D(h) => h.0,
            ResourceRef::TextureCube(h) => h.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_indices_are_dense_and_distinct() {
        for (expected, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), expected);
        }
    }

    #[test]
    fn resource_ref_reports_kind_and_index() {
        let r = ResourceRef::Texture2D(Texture2DHandle(7));
        assert_eq!(r.kind(), ResourceKind::Texture2D);
        assert_eq!(r.index(), 7);
    }
}
