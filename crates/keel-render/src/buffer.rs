//! Vertex and element buffer descriptions.

use crate::error::{FrontendError, RecordError};
use crate::pool::PoolItem;
use crate::resource::{LifeState, ResourceKind};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("static buffer contents are sealed after initialization")]
    Sealed,
    #[error("buffer describes no vertex attributes")]
    NoAttributes,
    #[error("attribute {index} ends past the vertex stride")]
    AttributeOutOfStride { index: usize },
    #[error("vertex store of {len} bytes is not a multiple of the stride {stride}")]
    MisalignedVertices { len: usize, stride: usize },
    #[error("element store of {len} bytes is not a multiple of the element size {size}")]
    MisalignedElements { len: usize, size: usize },
    #[error("buffer records no element kind but holds element data")]
    UnexpectedElements,
}

/// Scalar type of a vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    F32,
    U8,
}

impl AttributeKind {
    pub fn size(self) -> usize {
        match self {
            AttributeKind::F32 => 4,
            AttributeKind::U8 => 1,
        }
    }
}

/// One vertex attribute within the stride.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub kind: AttributeKind,
    /// Scalars per vertex.
    pub count: usize,
    /// Byte offset from the start of the vertex.
    pub offset: usize,
}

impl Attribute {
    pub fn byte_size(&self) -> usize {
        self.kind.size() * self.count
    }
}

/// Element index width; `None` for non-indexed buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ElementKind {
    #[default]
    None,
    U8,
    U16,
    U32,
}

impl ElementKind {
    pub fn size(self) -> usize {
        match self {
            ElementKind::None => 0,
            ElementKind::U8 => 1,
            ElementKind::U16 => 2,
            ElementKind::U32 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BufferKind {
    #[default]
    Static,
    Dynamic,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct Recorded: u8 {
        const KIND = 1 << 0;
        const STRIDE = 1 << 1;
        const ELEMENT_KIND = 1 << 2;
    }
}

/// A vertex buffer description and its CPU-side stores.
///
/// The shape of the buffer (kind, stride, element kind) is recorded exactly
/// once; attributes are appended. Contents may be rewritten until the buffer
/// is initialized, after which only dynamic buffers stay writable.
#[derive(Debug, Default)]
pub struct Buffer {
    life: LifeState,
    recorded: Recorded,
    kind: BufferKind,
    stride: usize,
    element_kind: ElementKind,
    attributes: Vec<Attribute>,
    vertices: Vec<u8>,
    elements: Vec<u8>,
}

impl Buffer {
    fn record(&mut self, field: Recorded, name: &'static str) -> Result<(), RecordError> {
        if self.recorded.contains(field) {
            return Err(RecordError::AlreadyRecorded { field: name });
        }
        self.recorded.insert(field);
        Ok(())
    }

    fn recorded(&self, field: Recorded, name: &'static str) -> Result<(), RecordError> {
        if !self.recorded.contains(field) {
            return Err(RecordError::Missing { field: name });
        }
        Ok(())
    }

    pub fn record_kind(&mut self, kind: BufferKind) -> Result<(), RecordError> {
        self.record(Recorded::KIND, "buffer kind")?;
        self.kind = kind;
        Ok(())
    }

    pub fn record_stride(&mut self, stride: usize) -> Result<(), RecordError> {
        self.record(Recorded::STRIDE, "buffer stride")?;
        self.stride = stride;
        Ok(())
    }

    pub fn record_element_kind(&mut self, element_kind: ElementKind) -> Result<(), RecordError> {
        self.record(Recorded::ELEMENT_KIND, "buffer element kind")?;
        self.element_kind = element_kind;
        Ok(())
    }

    pub fn record_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    fn writable(&self) -> Result<(), BufferError> {
        if self.life == LifeState::Ready && self.kind == BufferKind::Static {
            return Err(BufferError::Sealed);
        }
        Ok(())
    }

    /// Replace the vertex store.
    pub fn write_vertices(&mut self, data: &[u8]) -> Result<(), BufferError> {
        self.writable()?;
        self.vertices.clear();
        self.vertices.extend_from_slice(data);
        Ok(())
    }

    /// Replace the element store.
    pub fn write_elements(&mut self, data: &[u8]) -> Result<(), BufferError> {
        self.writable()?;
        self.elements.clear();
        self.elements.extend_from_slice(data);
        Ok(())
    }

    /// Size the vertex store to `size` bytes and expose it for writing.
    pub fn map_vertices(&mut self, size: usize) -> Result<&mut [u8], BufferError> {
        self.writable()?;
        self.vertices.resize(size, 0);
        Ok(&mut self.vertices)
    }

    /// Size the element store to `size` bytes and expose it for writing.
    pub fn map_elements(&mut self, size: usize) -> Result<&mut [u8], BufferError> {
        self.writable()?;
        self.elements.resize(size, 0);
        Ok(&mut self.elements)
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn element_kind(&self) -> ElementKind {
        self.element_kind
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn vertices(&self) -> &[u8] {
        &self.vertices
    }

    pub fn elements(&self) -> &[u8] {
        &self.elements
    }

    /// Check the description is complete and internally consistent.
    pub fn validate(&self) -> Result<(), FrontendError> {
        self.recorded(Recorded::KIND, "buffer kind")?;
        self.recorded(Recorded::STRIDE, "buffer stride")?;
        self.recorded(Recorded::ELEMENT_KIND, "buffer element kind")?;
        if self.attributes.is_empty() {
            return Err(BufferError::NoAttributes.into());
        }
        for (index, attribute) in self.attributes.iter().enumerate() {
            if attribute.offset + attribute.byte_size() > self.stride {
                return Err(BufferError::AttributeOutOfStride { index }.into());
            }
        }
        // A zero stride can never tile a non-empty store.
        if !self.vertices.is_empty() && (self.stride == 0 || self.vertices.len() % self.stride != 0)
        {
            return Err(BufferError::MisalignedVertices {
                len: self.vertices.len(),
                stride: self.stride,
            }
            .into());
        }
        match self.element_kind {
            ElementKind::None => {
                if !self.elements.is_empty() {
                    return Err(BufferError::UnexpectedElements.into());
                }
            }
            kind => {
                if self.elements.len() % kind.size() != 0 {
                    return Err(BufferError::MisalignedElements {
                        len: self.elements.len(),
                        size: kind.size(),
                    }
                    .into());
                }
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

impl PoolItem for Buffer {
    const KIND: ResourceKind = ResourceKind::Buffer;

    fn byte_usage(&self) -> usize {
        self.vertices.len() + self.elements.len()
    }
}
