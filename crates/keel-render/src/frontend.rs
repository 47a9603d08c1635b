//! The render frontend: pooled resource lifecycle and frame recording.
//!
//! One [`Frontend`] owns every resource pool, the frame arena, and the
//! deferred-destroy lists behind a single mutex. Producer threads create and
//! describe resources and record draw, clear and blit commands; one consumer
//! drains the recorded frame into a [`RenderBackend`] with
//! [`process`](Frontend::process) and presents with [`swap`](Frontend::swap).
//! Destroyed resources keep their pool slot until the backend has been
//! handed their `ResourceDestroy` command, so a handle is never reissued
//! while the backend might still act on the old resource.

use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

use crate::arena::{ArenaError, CommandArena};
use crate::backend::{AllocationInfo, RenderBackend};
use crate::buffer::{Buffer, BufferKind};
use crate::command::{BlitCmd, ClearCmd, Command, CommandError, DrawCmd, TextureBinding};
use crate::error::FrontendError;
use crate::pool::{Pool, PoolItem};
use crate::program::Program;
use crate::resource::{
    BufferHandle, LifeState, ProgramHandle, ResourceKind, ResourceRef, TargetHandle,
    Texture1DHandle, Texture2DHandle, Texture3DHandle, TextureCubeHandle,
};
use crate::stats::{FrontendStats, FrontendStatsSnapshot, ResourceStats};
use crate::tag::Tag;
use crate::target::{Target, TargetError};
use crate::texture::{
    Extent, Extent1D, Extent2D, Extent3D, ExtentCube, Filter, Format, Texture, Texture1D,
    Texture2D, Texture3D, TextureCube, TextureKind, Wrap, Wrap2D,
};

/// Capacities a [`Frontend`] is built with; fixed for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontendOptions {
    pub max_buffers: usize,
    pub max_targets: usize,
    pub max_programs: usize,
    pub max_texture1d: usize,
    pub max_texture2d: usize,
    pub max_texture3d: usize,
    pub max_texture_cube: usize,
    /// Per-frame command memory in bytes; sizes both the entry slab and the
    /// payload block of each frame.
    pub command_memory: usize,
}

impl Default for FrontendOptions {
    fn default() -> Self {
        Self {
            max_buffers: 64,
            max_targets: 16,
            max_programs: 512,
            max_texture1d: 16,
            max_texture2d: 1024,
            max_texture3d: 16,
            max_texture_cube: 16,
            command_memory: 2 * 1024 * 1024,
        }
    }
}

/// Handles whose `ResourceDestroy` is recorded but whose slot is not yet
/// freed. Swapped out wholesale by `process()`.
#[derive(Default)]
struct DestroyLists {
    buffers: Vec<BufferHandle>,
    targets: Vec<TargetHandle>,
    programs: Vec<ProgramHandle>,
    textures_1d: Vec<Texture1DHandle>,
    textures_2d: Vec<Texture2DHandle>,
    textures_3d: Vec<Texture3DHandle>,
    textures_cube: Vec<TextureCubeHandle>,
}

impl DestroyLists {
    fn take(&mut self) -> DestroyLists {
        mem::take(self)
    }
}

struct Inner {
    buffers: Pool<Buffer>,
    targets: Pool<Target>,
    programs: Pool<Program>,
    textures_1d: Pool<Texture1D>,
    textures_2d: Pool<Texture2D>,
    textures_3d: Pool<Texture3D>,
    textures_cube: Pool<TextureCube>,
    arena: CommandArena,
    destroys: DestroyLists,
}

/// Ties a pooled resource type to its handle, pool field and deferred list,
/// so the lifecycle methods can be written once.
trait Pooled: PoolItem + Default {
    type Handle: Copy;

    fn handle(index: u32) -> Self::Handle;
    fn index(handle: Self::Handle) -> u32;
    fn resource_ref(handle: Self::Handle) -> ResourceRef;
    fn pool(inner: &Inner) -> &Pool<Self>;
    fn pool_mut(inner: &mut Inner) -> &mut Pool<Self>;
    fn push_destroy(inner: &mut Inner, handle: Self::Handle);
    fn life(&self) -> LifeState;
    fn set_life(&mut self, life: LifeState);
    fn validate(&self) -> Result<(), FrontendError>;
}

macro_rules! impl_pooled {
    ($ty:ty, $handle:ident, $variant:ident, $field:ident) => {
        impl Pooled for $ty {
            type Handle = $handle;

            fn handle(index: u32) -> $handle {
                $handle(index)
            }

            fn index(handle: $handle) -> u32 {
                handle.0
            }

            fn resource_ref(handle: $handle) -> ResourceRef {
                ResourceRef::$variant(handle)
            }

            fn pool(inner: &Inner) -> &Pool<Self> {
                &inner.$field
            }

            fn pool_mut(inner: &mut Inner) -> &mut Pool<Self> {
                &mut inner.$field
            }

            fn push_destroy(inner: &mut Inner, handle: $handle) {
                inner.destroys.$field.push(handle);
            }

            fn life(&self) -> LifeState {
                Self::life(self)
            }

            fn set_life(&mut self, life: LifeState) {
                Self::set_life(self, life);
            }

            fn validate(&self) -> Result<(), FrontendError> {
                Self::validate(self)
            }
        }
    };
}

impl_pooled!(Buffer, BufferHandle, Buffer, buffers);
impl_pooled!(Target, TargetHandle, Target, targets);
impl_pooled!(Program, ProgramHandle, Program, programs);
impl_pooled!(Texture1D, Texture1DHandle, Texture1D, textures_1d);
impl_pooled!(Texture2D, Texture2DHandle, Texture2D, textures_2d);
impl_pooled!(Texture3D, Texture3DHandle, Texture3D, textures_3d);
impl_pooled!(TextureCube, TextureCubeHandle, TextureCube, textures_cube);

/// Scoped access to one pooled resource record.
///
/// Holds the frontend lock for its lifetime; keep guards short-lived.
/// Dereferences shared for reads and mutable for record/store writes.
pub struct ResourceGuard<'a, T: PoolItem> {
    guard: MutexGuard<'a, Inner>,
    read: fn(&Inner) -> &Pool<T>,
    write: fn(&mut Inner) -> &mut Pool<T>,
    index: u32,
}

impl<T: PoolItem> Deref for ResourceGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        (self.read)(&self.guard)
            .get(self.index)
            .expect("pooled slot vanished while guarded")
    }
}

impl<T: PoolItem> DerefMut for ResourceGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        (self.write)(&mut self.guard)
            .get_mut(self.index)
            .expect("pooled slot vanished while guarded")
    }
}

#[derive(Clone, Copy)]
enum AttachmentRole {
    Depth,
    Stencil,
    DepthStencil,
}

/// Thread-safe orchestrator for resource lifecycle and frame recording.
pub struct Frontend {
    inner: Mutex<Inner>,
    info: AllocationInfo,
    options: FrontendOptions,
    stats: FrontendStats,
}

impl Frontend {
    /// Build a frontend with every pool and both frame storages
    /// preallocated. `info` comes from
    /// [`RenderBackend::allocation_info`], queried once by the caller.
    pub fn new(info: AllocationInfo, options: FrontendOptions) -> Self {
        tracing::debug!(
            buffers = options.max_buffers,
            targets = options.max_targets,
            programs = options.max_programs,
            textures_1d = options.max_texture1d,
            textures_2d = options.max_texture2d,
            textures_3d = options.max_texture3d,
            textures_cube = options.max_texture_cube,
            command_memory = options.command_memory,
            "render frontend up"
        );
        Self {
            inner: Mutex::new(Inner {
                buffers: Pool::new(options.max_buffers),
                targets: Pool::new(options.max_targets),
                programs: Pool::new(options.max_programs),
                textures_1d: Pool::new(options.max_texture1d),
                textures_2d: Pool::new(options.max_texture2d),
                textures_3d: Pool::new(options.max_texture3d),
                textures_cube: Pool::new(options.max_texture_cube),
                arena: CommandArena::new(options.command_memory),
                destroys: DestroyLists::default(),
            }),
            info,
            options,
            stats: FrontendStats::default(),
        }
    }

    pub fn options(&self) -> &FrontendOptions {
        &self.options
    }

    pub fn allocation_info(&self) -> AllocationInfo {
        self.info
    }

    fn locked(&self) -> Result<MutexGuard<'_, Inner>, FrontendError> {
        self.inner.lock().map_err(|_| FrontendError::Poisoned)
    }

    fn require_ready(life: LifeState, kind: ResourceKind, index: u32) -> Result<(), FrontendError> {
        match life {
            LifeState::Ready => Ok(()),
            LifeState::Allocated => Err(FrontendError::NotReady { kind, index }),
            LifeState::PendingDestroy => Err(FrontendError::AlreadyDestroyed { kind, index }),
        }
    }

    fn require_recording(
        life: LifeState,
        kind: ResourceKind,
        index: u32,
    ) -> Result<(), FrontendError> {
        match life {
            LifeState::Allocated => Ok(()),
            LifeState::Ready => Err(FrontendError::AlreadyInitialized { kind, index }),
            LifeState::PendingDestroy => Err(FrontendError::AlreadyDestroyed { kind, index }),
        }
    }

    fn ready<T: Pooled>(inner: &Inner, handle: T::Handle) -> Result<(), FrontendError> {
        let index = T::index(handle);
        let record = T::pool(inner)
            .get(index)
            .ok_or(FrontendError::InvalidHandle {
                kind: T::KIND,
                index,
            })?;
        Self::require_ready(record.life(), T::KIND, index)
    }

    fn create<T: Pooled>(&self, tag: Tag) -> Result<T::Handle, FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let capacity = T::pool(inner).capacity();
        let index = match T::pool_mut(inner).allocate(T::default()) {
            Some(index) => index,
            None => {
                return Err(FrontendError::PoolExhausted {
                    kind: T::KIND,
                    capacity,
                })
            }
        };
        let handle = T::handle(index);
        if let Err(error) = inner
            .arena
            .record(tag, Command::ResourceAllocate(T::resource_ref(handle)))
        {
            // A full frame must not leak the slot it could not announce.
            T::pool_mut(inner).free(index);
            return Err(error.into());
        }
        self.stats.inc_resources_created();
        Ok(handle)
    }

    fn initialize<T: Pooled>(&self, tag: Tag, handle: T::Handle) -> Result<(), FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let index = T::index(handle);
        {
            let record = T::pool(inner)
                .get(index)
                .ok_or(FrontendError::InvalidHandle {
                    kind: T::KIND,
                    index,
                })?;
            Self::require_recording(record.life(), T::KIND, index)?;
            record.validate()?;
        }
        inner
            .arena
            .record(tag, Command::ResourceConstruct(T::resource_ref(handle)))?;
        if let Some(record) = T::pool_mut(inner).get_mut(index) {
            record.set_life(LifeState::Ready);
        }
        Ok(())
    }

    fn destroy_locked<T: Pooled>(
        tag: Tag,
        handle: T::Handle,
        inner: &mut Inner,
    ) -> Result<(), FrontendError> {
        let index = T::index(handle);
        let record = T::pool(inner)
            .get(index)
            .ok_or(FrontendError::InvalidHandle {
                kind: T::KIND,
                index,
            })?;
        if record.life() == LifeState::PendingDestroy {
            return Err(FrontendError::AlreadyDestroyed {
                kind: T::KIND,
                index,
            });
        }
        inner
            .arena
            .record(tag, Command::ResourceDestroy(T::resource_ref(handle)))?;
        if let Some(record) = T::pool_mut(inner).get_mut(index) {
            record.set_life(LifeState::PendingDestroy);
        }
        T::push_destroy(inner, handle);
        Ok(())
    }

    fn destroy<T: Pooled>(&self, tag: Tag, handle: T::Handle) -> Result<(), FrontendError> {
        let mut guard = self.locked()?;
        Self::destroy_locked::<T>(tag, handle, &mut guard)
    }

    fn resource_mut<T: Pooled>(
        &self,
        handle: T::Handle,
    ) -> Result<ResourceGuard<'_, T>, FrontendError> {
        let guard = self.locked()?;
        let index = T::index(handle);
        if T::pool(&guard).get(index).is_none() {
            return Err(FrontendError::InvalidHandle {
                kind: T::KIND,
                index,
            });
        }
        Ok(ResourceGuard {
            guard,
            read: T::pool,
            write: T::pool_mut,
            index,
        })
    }

    pub fn create_buffer(&self, tag: Tag) -> Result<BufferHandle, FrontendError> {
        self.create::<Buffer>(tag)
    }

    pub fn create_target(&self, tag: Tag) -> Result<TargetHandle, FrontendError> {
        self.create::<Target>(tag)
    }

    pub fn create_program(&self, tag: Tag) -> Result<ProgramHandle, FrontendError> {
        self.create::<Program>(tag)
    }

    pub fn create_texture1d(&self, tag: Tag) -> Result<Texture1DHandle, FrontendError> {
        self.create::<Texture1D>(tag)
    }

    pub fn create_texture2d(&self, tag: Tag) -> Result<Texture2DHandle, FrontendError> {
        self.create::<Texture2D>(tag)
    }

    pub fn create_texture3d(&self, tag: Tag) -> Result<Texture3DHandle, FrontendError> {
        self.create::<Texture3D>(tag)
    }

    pub fn create_texture_cube(&self, tag: Tag) -> Result<TextureCubeHandle, FrontendError> {
        self.create::<TextureCube>(tag)
    }

    pub fn buffer_mut(
        &self,
        buffer: BufferHandle,
    ) -> Result<ResourceGuard<'_, Buffer>, FrontendError> {
        self.resource_mut::<Buffer>(buffer)
    }

    pub fn target_mut(
        &self,
        target: TargetHandle,
    ) -> Result<ResourceGuard<'_, Target>, FrontendError> {
        self.resource_mut::<Target>(target)
    }

    pub fn program_mut(
        &self,
        program: ProgramHandle,
    ) -> Result<ResourceGuard<'_, Program>, FrontendError> {
        self.resource_mut::<Program>(program)
    }

    pub fn texture1d_mut(
        &self,
        texture: Texture1DHandle,
    ) -> Result<ResourceGuard<'_, Texture1D>, FrontendError> {
        self.resource_mut::<Texture1D>(texture)
    }

    pub fn texture2d_mut(
        &self,
        texture: Texture2DHandle,
    ) -> Result<ResourceGuard<'_, Texture2D>, FrontendError> {
        self.resource_mut::<Texture2D>(texture)
    }

    pub fn texture3d_mut(
        &self,
        texture: Texture3DHandle,
    ) -> Result<ResourceGuard<'_, Texture3D>, FrontendError> {
        self.resource_mut::<Texture3D>(texture)
    }

    pub fn texture_cube_mut(
        &self,
        texture: TextureCubeHandle,
    ) -> Result<ResourceGuard<'_, TextureCube>, FrontendError> {
        self.resource_mut::<TextureCube>(texture)
    }

    pub fn initialize_buffer(&self, tag: Tag, buffer: BufferHandle) -> Result<(), FrontendError> {
        self.initialize::<Buffer>(tag, buffer)
    }

    pub fn initialize_target(&self, tag: Tag, target: TargetHandle) -> Result<(), FrontendError> {
        self.initialize::<Target>(tag, target)
    }

    pub fn initialize_program(
        &self,
        tag: Tag,
        program: ProgramHandle,
    ) -> Result<(), FrontendError> {
        self.initialize::<Program>(tag, program)
    }

    pub fn initialize_texture1d(
        &self,
        tag: Tag,
        texture: Texture1DHandle,
    ) -> Result<(), FrontendError> {
        self.initialize::<Texture1D>(tag, texture)
    }

    pub fn initialize_texture2d(
        &self,
        tag: Tag,
        texture: Texture2DHandle,
    ) -> Result<(), FrontendError> {
        self.initialize::<Texture2D>(tag, texture)
    }

    pub fn initialize_texture3d(
        &self,
        tag: Tag,
        texture: Texture3DHandle,
    ) -> Result<(), FrontendError> {
        self.initialize::<Texture3D>(tag, texture)
    }

    pub fn initialize_texture_cube(
        &self,
        tag: Tag,
        texture: TextureCubeHandle,
    ) -> Result<(), FrontendError> {
        self.initialize::<TextureCube>(tag, texture)
    }

    /// Re-upload a dynamic buffer's stores on the next `process()`.
    pub fn update_buffer(&self, tag: Tag, buffer: BufferHandle) -> Result<(), FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let index = buffer.0;
        let record = inner
            .buffers
            .get(index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Buffer,
                index,
            })?;
        Self::require_ready(record.life(), ResourceKind::Buffer, index)?;
        if record.kind() != BufferKind::Dynamic {
            return Err(FrontendError::NotDynamic {
                kind: ResourceKind::Buffer,
                index,
            });
        }
        inner
            .arena
            .record(tag, Command::ResourceUpdate(ResourceRef::Buffer(buffer)))?;
        Ok(())
    }

    fn update_texture<E: Extent>(
        &self,
        tag: Tag,
        handle: <Texture<E> as Pooled>::Handle,
    ) -> Result<(), FrontendError>
    where
        Texture<E>: Pooled,
    {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let index = <Texture<E> as Pooled>::index(handle);
        let record = <Texture<E> as Pooled>::pool(inner)
            .get(index)
            .ok_or(FrontendError::InvalidHandle {
                kind: E::KIND,
                index,
            })?;
        Self::require_ready(record.life(), E::KIND, index)?;
        if record.kind() != TextureKind::Dynamic {
            return Err(FrontendError::NotDynamic {
                kind: E::KIND,
                index,
            });
        }
        inner.arena.record(
            tag,
            Command::ResourceUpdate(<Texture<E> as Pooled>::resource_ref(handle)),
        )?;
        Ok(())
    }

    /// Re-upload a dynamic 1D texture's store on the next `process()`.
    pub fn update_texture1d(
        &self,
        tag: Tag,
        texture: Texture1DHandle,
    ) -> Result<(), FrontendError> {
        self.update_texture::<Extent1D>(tag, texture)
    }

    /// Re-upload a dynamic 2D texture's store on the next `process()`.
    pub fn update_texture2d(
        &self,
        tag: Tag,
        texture: Texture2DHandle,
    ) -> Result<(), FrontendError> {
        self.update_texture::<Extent2D>(tag, texture)
    }

    /// Re-upload a dynamic 3D texture's store on the next `process()`.
    pub fn update_texture3d(
        &self,
        tag: Tag,
        texture: Texture3DHandle,
    ) -> Result<(), FrontendError> {
        self.update_texture::<Extent3D>(tag, texture)
    }

    /// Re-upload a dynamic cube texture's stores on the next `process()`.
    pub fn update_texture_cube(
        &self,
        tag: Tag,
        texture: TextureCubeHandle,
    ) -> Result<(), FrontendError> {
        self.update_texture::<ExtentCube>(tag, texture)
    }

    pub fn destroy_buffer(&self, tag: Tag, buffer: BufferHandle) -> Result<(), FrontendError> {
        self.destroy::<Buffer>(tag, buffer)
    }

    /// Destroy a target and, transitively, the attachment textures it owns.
    ///
    /// The owned textures are collected and retired under the same lock
    /// acquisition, so the teardown is atomic with respect to other
    /// producers. A texture the caller already destroyed is skipped.
    pub fn destroy_target(&self, tag: Tag, target: TargetHandle) -> Result<(), FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let index = target.0;
        let owned = inner
            .targets
            .get(index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Target,
                index,
            })?
            .owned_textures();
        Self::destroy_locked::<Target>(tag, target, inner)?;
        for texture in owned.into_iter().flatten() {
            match Self::destroy_locked::<Texture2D>(tag, texture, inner) {
                Ok(()) | Err(FrontendError::AlreadyDestroyed { .. }) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }

    pub fn destroy_program(&self, tag: Tag, program: ProgramHandle) -> Result<(), FrontendError> {
        self.destroy::<Program>(tag, program)
    }

    pub fn destroy_texture1d(
        &self,
        tag: Tag,
        texture: Texture1DHandle,
    ) -> Result<(), FrontendError> {
        self.destroy::<Texture1D>(tag, texture)
    }

    pub fn destroy_texture2d(
        &self,
        tag: Tag,
        texture: Texture2DHandle,
    ) -> Result<(), FrontendError> {
        self.destroy::<Texture2D>(tag, texture)
    }

    pub fn destroy_texture3d(
        &self,
        tag: Tag,
        texture: Texture3DHandle,
    ) -> Result<(), FrontendError> {
        self.destroy::<Texture3D>(tag, texture)
    }

    pub fn destroy_texture_cube(
        &self,
        tag: Tag,
        texture: TextureCubeHandle,
    ) -> Result<(), FrontendError> {
        self.destroy::<TextureCube>(tag, texture)
    }

    /// Create, construct and attach a target-owned depth texture.
    pub fn request_depth(
        &self,
        tag: Tag,
        target: TargetHandle,
        format: Format,
        dimensions: Extent2D,
    ) -> Result<Texture2DHandle, FrontendError> {
        self.request_attachment(tag, target, format, dimensions, AttachmentRole::Depth)
    }

    /// Create, construct and attach a target-owned stencil texture.
    pub fn request_stencil(
        &self,
        tag: Tag,
        target: TargetHandle,
        format: Format,
        dimensions: Extent2D,
    ) -> Result<Texture2DHandle, FrontendError> {
        self.request_attachment(tag, target, format, dimensions, AttachmentRole::Stencil)
    }

    /// Create, construct and attach one target-owned texture serving both
    /// the depth and the stencil aspect.
    pub fn request_depth_stencil(
        &self,
        tag: Tag,
        target: TargetHandle,
        format: Format,
        dimensions: Extent2D,
    ) -> Result<Texture2DHandle, FrontendError> {
        self.request_attachment(tag, target, format, dimensions, AttachmentRole::DepthStencil)
    }

    fn request_attachment(
        &self,
        tag: Tag,
        target: TargetHandle,
        format: Format,
        dimensions: Extent2D,
        role: AttachmentRole,
    ) -> Result<Texture2DHandle, FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let target_index = target.0;
        {
            let record = inner
                .targets
                .get(target_index)
                .ok_or(FrontendError::InvalidHandle {
                    kind: ResourceKind::Target,
                    index: target_index,
                })?;
            Self::require_recording(record.life(), ResourceKind::Target, target_index)?;
        }

        let capacity = inner.textures_2d.capacity();
        let index = match inner.textures_2d.allocate(Texture2D::default()) {
            Some(index) => index,
            None => {
                return Err(FrontendError::PoolExhausted {
                    kind: ResourceKind::Texture2D,
                    capacity,
                })
            }
        };
        let handle = Texture2DHandle(index);
        if let Err(error) = inner
            .arena
            .record(tag, Command::ResourceAllocate(ResourceRef::Texture2D(handle)))
        {
            inner.textures_2d.free(index);
            return Err(error.into());
        }
        self.stats.inc_resources_created();

        if let Err(error) =
            Self::describe_and_attach(inner, tag, handle, target_index, format, dimensions, role)
        {
            // Unwind the helper texture; the caller never sees its handle.
            if let Err(destroy_error) = Self::destroy_locked::<Texture2D>(tag, handle, inner) {
                tracing::warn!(
                    error = %destroy_error,
                    "orphaned helper texture after failed attachment"
                );
            }
            return Err(error);
        }
        Ok(handle)
    }

    fn describe_and_attach(
        inner: &mut Inner,
        tag: Tag,
        handle: Texture2DHandle,
        target_index: u32,
        format: Format,
        dimensions: Extent2D,
        role: AttachmentRole,
    ) -> Result<(), FrontendError> {
        let index = handle.0;
        {
            let texture = inner
                .textures_2d
                .get_mut(index)
                .ok_or(FrontendError::InvalidHandle {
                    kind: ResourceKind::Texture2D,
                    index,
                })?;
            texture.record_kind(TextureKind::Attachment)?;
            texture.record_format(format)?;
            texture.record_filter(Filter::default())?;
            texture.record_wrap(Wrap2D::all(Wrap::ClampToEdge))?;
            texture.record_dimensions(dimensions)?;
            texture.validate()?;
        }
        inner
            .arena
            .record(tag, Command::ResourceConstruct(ResourceRef::Texture2D(handle)))?;
        if let Some(texture) = inner.textures_2d.get_mut(index) {
            texture.set_life(LifeState::Ready);
        }
        let record = inner
            .targets
            .get_mut(target_index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Target,
                index: target_index,
            })?;
        let attach = match role {
            AttachmentRole::Depth => Target::attach_depth,
            AttachmentRole::Stencil => Target::attach_stencil,
            AttachmentRole::DepthStencil => Target::attach_depth_stencil,
        };
        attach(record, handle, format, dimensions, true)?;
        Ok(())
    }

    fn attachment_inputs(
        inner: &Inner,
        target: TargetHandle,
        texture: Texture2DHandle,
    ) -> Result<(Format, Extent2D), FrontendError> {
        let target_index = target.0;
        let record = inner
            .targets
            .get(target_index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Target,
                index: target_index,
            })?;
        Self::require_recording(record.life(), ResourceKind::Target, target_index)?;

        let index = texture.0;
        let record = inner
            .textures_2d
            .get(index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Texture2D,
                index,
            })?;
        Self::require_ready(record.life(), ResourceKind::Texture2D, index)?;
        if record.kind() != TextureKind::Attachment {
            return Err(TargetError::NotAnAttachment.into());
        }
        Ok((record.format(), record.dimensions()))
    }

    fn attach_existing(
        &self,
        target: TargetHandle,
        texture: Texture2DHandle,
        role: AttachmentRole,
    ) -> Result<(), FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let (format, dimensions) = Self::attachment_inputs(inner, target, texture)?;
        let record = inner
            .targets
            .get_mut(target.0)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Target,
                index: target.0,
            })?;
        let attach = match role {
            AttachmentRole::Depth => Target::attach_depth,
            AttachmentRole::Stencil => Target::attach_stencil,
            AttachmentRole::DepthStencil => Target::attach_depth_stencil,
        };
        attach(record, texture, format, dimensions, false)?;
        Ok(())
    }

    /// Attach a caller-owned depth texture; it must be initialized and of
    /// [`TextureKind::Attachment`].
    pub fn attach_depth(
        &self,
        target: TargetHandle,
        texture: Texture2DHandle,
    ) -> Result<(), FrontendError> {
        self.attach_existing(target, texture, AttachmentRole::Depth)
    }

    /// Attach a caller-owned stencil texture.
    pub fn attach_stencil(
        &self,
        target: TargetHandle,
        texture: Texture2DHandle,
    ) -> Result<(), FrontendError> {
        self.attach_existing(target, texture, AttachmentRole::Stencil)
    }

    /// Attach a caller-owned combined depth-stencil texture.
    pub fn attach_depth_stencil(
        &self,
        target: TargetHandle,
        texture: Texture2DHandle,
    ) -> Result<(), FrontendError> {
        self.attach_existing(target, texture, AttachmentRole::DepthStencil)
    }

    /// Append a caller-owned color attachment.
    pub fn attach_color(
        &self,
        target: TargetHandle,
        texture: Texture2DHandle,
    ) -> Result<(), FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let (format, dimensions) = Self::attachment_inputs(inner, target, texture)?;
        let record = inner
            .targets
            .get_mut(target.0)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Target,
                index: target.0,
            })?;
        record.attach_color(texture, format, dimensions)?;
        Ok(())
    }

    /// Record a clear of the named aspects of `clear.target`.
    pub fn clear(&self, tag: Tag, clear: ClearCmd) -> Result<(), FrontendError> {
        if !clear.clears_anything() {
            return Err(CommandError::EmptyClear.into());
        }
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        let index = clear.target.0;
        let target = inner
            .targets
            .get(index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Target,
                index,
            })?;
        Self::require_ready(target.life(), ResourceKind::Target, index)?;
        // The swapchain carries an implicit depth-stencil surface.
        if clear.depth.is_some() && !(target.has_depth() || target.is_swapchain()) {
            return Err(FrontendError::ClearAspectMissing { aspect: "depth" });
        }
        if clear.stencil.is_some() && !(target.has_stencil() || target.is_swapchain()) {
            return Err(FrontendError::ClearAspectMissing { aspect: "stencil" });
        }
        for &attachment in clear.draw_buffers.indices() {
            if !target.has_color_attachment(attachment) {
                return Err(TargetError::NoAttachment { index: attachment }.into());
            }
        }
        for (attachment, color) in clear.colors.iter().enumerate() {
            if color.is_some() && !target.has_color_attachment(attachment as u8) {
                return Err(TargetError::NoAttachment {
                    index: attachment as u8,
                }
                .into());
            }
        }
        inner.arena.record(tag, Command::Clear(clear))?;
        Ok(())
    }

    /// Record a draw. The command's dirty program uniforms are flushed into
    /// a frame payload here; `draw.uniforms` is overwritten with the span.
    pub fn draw(&self, tag: Tag, draw: DrawCmd) -> Result<(), FrontendError> {
        if draw.count == 0 {
            return Err(CommandError::EmptyDraw.into());
        }
        let mut guard = self.locked()?;
        let inner = &mut *guard;

        let target_index = draw.target.0;
        let target = inner
            .targets
            .get(target_index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Target,
                index: target_index,
            })?;
        Self::require_ready(target.life(), ResourceKind::Target, target_index)?;
        for &attachment in draw.draw_buffers.indices() {
            if !target.has_color_attachment(attachment) {
                return Err(TargetError::NoAttachment { index: attachment }.into());
            }
        }
        Self::ready::<Buffer>(inner, draw.buffer)?;
        Self::ready::<Program>(inner, draw.program)?;
        for (_, binding) in draw.textures.iter() {
            match binding {
                TextureBinding::Texture1D(handle) => Self::ready::<Texture1D>(inner, handle)?,
                TextureBinding::Texture2D(handle) => Self::ready::<Texture2D>(inner, handle)?,
                TextureBinding::Texture3D(handle) => Self::ready::<Texture3D>(inner, handle)?,
                TextureBinding::TextureCube(handle) => Self::ready::<TextureCube>(inner, handle)?,
            }
        }

        // Claim the entry up front: a full frame must not eat the uniform
        // flush below, or the dirty values would be lost.
        if inner.arena.recorded() == inner.arena.entry_capacity() {
            return Err(ArenaError::CommandsExhausted {
                capacity: inner.arena.entry_capacity(),
            }
            .into());
        }
        let program_index = draw.program.0;
        let size = inner
            .programs
            .get(program_index)
            .ok_or(FrontendError::InvalidHandle {
                kind: ResourceKind::Program,
                index: program_index,
            })?
            .dirty_uniforms_byte_size();
        let mut draw = draw;
        draw.uniforms = inner.arena.alloc_payload(size)?;
        if size > 0 {
            let program = inner
                .programs
                .get_mut(program_index)
                .ok_or(FrontendError::InvalidHandle {
                    kind: ResourceKind::Program,
                    index: program_index,
                })?;
            program.flush_dirty_uniforms(inner.arena.payload_mut(draw.uniforms));
        }
        draw.state.flush();
        inner.arena.record(tag, Command::Draw(draw))?;
        Ok(())
    }

    /// Record a color copy between two targets' attachments.
    pub fn blit(&self, tag: Tag, blit: BlitCmd) -> Result<(), FrontendError> {
        let mut guard = self.locked()?;
        let inner = &mut *guard;
        for (handle, attachment) in [(blit.src, blit.src_attachment), (blit.dst, blit.dst_attachment)]
        {
            let index = handle.0;
            let target = inner
                .targets
                .get(index)
                .ok_or(FrontendError::InvalidHandle {
                    kind: ResourceKind::Target,
                    index,
                })?;
            Self::require_ready(target.life(), ResourceKind::Target, index)?;
            if !target.has_color_attachment(attachment) {
                return Err(TargetError::NoAttachment { index: attachment }.into());
            }
        }
        inner.arena.record(tag, Command::Blit(blit))?;
        Ok(())
    }

    /// Hand the recorded frame to `backend`, entry by entry, then free the
    /// slots of every resource whose destruction the backend has now seen.
    ///
    /// Returns `Ok(false)` without touching the backend when nothing was
    /// recorded. The lock is released while the backend runs; producers
    /// recording meanwhile write the standby frame storage.
    pub fn process(&self, backend: &mut dyn RenderBackend) -> Result<bool, FrontendError> {
        let (frame, destroys) = {
            let mut guard = self.locked()?;
            if guard.arena.is_empty() {
                return Ok(false);
            }
            let frame = guard.arena.begin_consume()?;
            let destroys = guard.destroys.take();
            (frame, destroys)
        };
        tracing::trace!(commands = frame.len(), "processing frame");

        let mut failure = None;
        for entry in frame.entries() {
            if let Err(error) = backend.process(&frame, entry) {
                failure = Some(error);
                break;
            }
            self.stats.inc_processed(entry.command.kind());
        }

        {
            let mut guard = self.locked()?;
            let inner = &mut *guard;
            self.free_destroyed(inner, destroys);
            inner.arena.end_consume(frame);
        }
        self.stats.inc_frames();

        match failure {
            Some(error) => Err(FrontendError::Backend(error)),
            None => Ok(true),
        }
    }

    fn free_destroyed(&self, inner: &mut Inner, destroys: DestroyLists) {
        for handle in destroys.buffers {
            if inner.buffers.free(handle.0).is_some() {
                self.stats.inc_resources_freed();
            }
        }
        for handle in destroys.targets {
            if inner.targets.free(handle.0).is_some() {
                self.stats.inc_resources_freed();
            }
        }
        for handle in destroys.programs {
            if inner.programs.free(handle.0).is_some() {
                self.stats.inc_resources_freed();
            }
        }
        for handle in destroys.textures_1d {
            if inner.textures_1d.free(handle.0).is_some() {
                self.stats.inc_resources_freed();
            }
        }
        for handle in destroys.textures_2d {
            if inner.textures_2d.free(handle.0).is_some() {
                self.stats.inc_resources_freed();
            }
        }
        for handle in destroys.textures_3d {
            if inner.textures_3d.free(handle.0).is_some() {
                self.stats.inc_resources_freed();
            }
        }
        for handle in destroys.textures_cube {
            if inner.textures_cube.free(handle.0).is_some() {
                self.stats.inc_resources_freed();
            }
        }
    }

    /// Present the swapchain.
    pub fn swap(&self, backend: &mut dyn RenderBackend) {
        backend.swap();
        self.stats.inc_swaps();
    }

    /// A consistent snapshot of counters and per-pool gauges.
    pub fn stats(&self) -> Result<FrontendStatsSnapshot, FrontendError> {
        fn gauge<T: PoolItem>(pool: &Pool<T>, info: &AllocationInfo) -> ResourceStats {
            ResourceStats {
                capacity: pool.capacity(),
                live: pool.live(),
                bytes: pool.byte_usage(),
                reserved: pool.live() * info.size_for(T::KIND),
            }
        }

        let guard = self.locked()?;
        let mut resources = [ResourceStats::default(); ResourceKind::COUNT];
        resources[ResourceKind::Buffer.index()] = gauge(&guard.buffers, &self.info);
        resources[ResourceKind::Target.index()] = gauge(&guard.targets, &self.info);
        resources[ResourceKind::Program.index()] = gauge(&guard.programs, &self.info);
        resources[ResourceKind::Texture1D.index()] = gauge(&guard.textures_1d, &self.info);
        resources[ResourceKind::Texture2D.index()] = gauge(&guard.textures_2d, &self.info);
        resources[ResourceKind::Texture3D.index()] = gauge(&guard.textures_3d, &self.info);
        resources[ResourceKind::TextureCube.index()] = gauge(&guard.textures_cube, &self.info);
        Ok(FrontendStatsSnapshot {
            counters: self.stats.counters(),
            resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NullBackend, RecordingBackend};
    use crate::buffer::{Attribute, AttributeKind, ElementKind};
    use crate::command::CommandKind;
    use crate::error::RecordError;
    use crate::render_tag;

    fn frontend() -> Frontend {
        Frontend::new(AllocationInfo::default(), FrontendOptions::default())
    }

    fn describe_buffer(frontend: &Frontend, buffer: BufferHandle) {
        let mut record = frontend.buffer_mut(buffer).unwrap();
        record.record_kind(BufferKind::Static).unwrap();
        record.record_stride(12).unwrap();
        record.record_element_kind(ElementKind::None).unwrap();
        record.record_attribute(Attribute {
            kind: AttributeKind::F32,
            count: 3,
            offset: 0,
        });
        record.write_vertices(&[0; 36]).unwrap();
    }

    #[test]
    fn buffer_lifecycle_reaches_the_backend_in_order() {
        let frontend = frontend();
        let mut backend = RecordingBackend::default();
        let buffer = frontend.create_buffer(render_tag!("triangle")).unwrap();
        describe_buffer(&frontend, buffer);
        frontend
            .initialize_buffer(render_tag!("triangle"), buffer)
            .unwrap();
        frontend
            .destroy_buffer(render_tag!("triangle"), buffer)
            .unwrap();
        assert!(frontend.process(&mut backend).unwrap());

        let kinds: Vec<CommandKind> = backend.observed.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CommandKind::ResourceAllocate,
                CommandKind::ResourceConstruct,
                CommandKind::ResourceDestroy,
            ]
        );

        // The slot was freed by process and is handed out again.
        let next = frontend.create_buffer(render_tag!("reuse")).unwrap();
        assert_eq!(next.0, buffer.0);
        let stats = frontend.stats().unwrap();
        assert_eq!(stats.counters.resources_created, 2);
        assert_eq!(stats.counters.resources_freed, 1);
        assert_eq!(stats.resource(ResourceKind::Buffer).live, 1);
    }

    #[test]
    fn lifecycle_gates_are_typed_errors() {
        let frontend = frontend();
        let buffer = frontend.create_buffer(render_tag!("gate")).unwrap();
        assert!(matches!(
            frontend.initialize_buffer(render_tag!("gate"), buffer),
            Err(FrontendError::Record(RecordError::Missing { .. }))
        ));
        describe_buffer(&frontend, buffer);
        frontend
            .initialize_buffer(render_tag!("gate"), buffer)
            .unwrap();
        assert_eq!(
            frontend.initialize_buffer(render_tag!("gate"), buffer),
            Err(FrontendError::AlreadyInitialized {
                kind: ResourceKind::Buffer,
                index: buffer.0,
            })
        );
        frontend
            .destroy_buffer(render_tag!("gate"), buffer)
            .unwrap();
        assert_eq!(
            frontend.destroy_buffer(render_tag!("gate"), buffer),
            Err(FrontendError::AlreadyDestroyed {
                kind: ResourceKind::Buffer,
                index: buffer.0,
            })
        );
        assert_eq!(
            frontend.update_buffer(render_tag!("gate"), BufferHandle(9)),
            Err(FrontendError::InvalidHandle {
                kind: ResourceKind::Buffer,
                index: 9,
            })
        );
    }

    #[test]
    fn pool_exhaustion_is_reported_with_capacity() {
        let options = FrontendOptions {
            max_buffers: 1,
            ..FrontendOptions::default()
        };
        let frontend = Frontend::new(AllocationInfo::default(), options);
        frontend.create_buffer(render_tag!("only")).unwrap();
        assert_eq!(
            frontend.create_buffer(render_tag!("spill")),
            Err(FrontendError::PoolExhausted {
                kind: ResourceKind::Buffer,
                capacity: 1,
            })
        );
    }

    #[test]
    fn update_requires_a_ready_dynamic_buffer() {
        let frontend = frontend();
        let fixed = frontend.create_buffer(render_tag!("static")).unwrap();
        describe_buffer(&frontend, fixed);
        frontend
            .initialize_buffer(render_tag!("static"), fixed)
            .unwrap();
        assert_eq!(
            frontend.update_buffer(render_tag!("static"), fixed),
            Err(FrontendError::NotDynamic {
                kind: ResourceKind::Buffer,
                index: fixed.0,
            })
        );

        let streamed = frontend.create_buffer(render_tag!("dynamic")).unwrap();
        {
            let mut record = frontend.buffer_mut(streamed).unwrap();
            record.record_kind(BufferKind::Dynamic).unwrap();
            record.record_stride(4).unwrap();
            record.record_element_kind(ElementKind::None).unwrap();
            record.record_attribute(Attribute {
                kind: AttributeKind::F32,
                count: 1,
                offset: 0,
            });
        }
        frontend
            .initialize_buffer(render_tag!("dynamic"), streamed)
            .unwrap();
        frontend
            .buffer_mut(streamed)
            .unwrap()
            .write_vertices(&[0; 8])
            .unwrap();
        frontend
            .update_buffer(render_tag!("dynamic"), streamed)
            .unwrap();
        assert!(frontend.process(&mut NullBackend).unwrap());

        let fresh = frontend.create_buffer(render_tag!("fresh")).unwrap();
        frontend
            .buffer_mut(fresh)
            .unwrap()
            .record_kind(BufferKind::Dynamic)
            .unwrap();
        assert_eq!(
            frontend.update_buffer(render_tag!("fresh"), fresh),
            Err(FrontendError::NotReady {
                kind: ResourceKind::Buffer,
                index: fresh.0,
            })
        );
    }

    #[test]
    fn update_requires_a_ready_dynamic_texture() {
        let frontend = frontend();
        let mut backend = RecordingBackend::default();
        let streamed = frontend.create_texture2d(render_tag!("streamed")).unwrap();
        {
            let mut record = frontend.texture2d_mut(streamed).unwrap();
            record.record_kind(TextureKind::Dynamic).unwrap();
            record.record_format(Format::RgbaU8).unwrap();
            record.record_filter(Filter::default()).unwrap();
            record.record_wrap(Wrap2D::all(Wrap::Repeat)).unwrap();
            record
                .record_dimensions(Extent2D {
                    width: 1,
                    height: 1,
                })
                .unwrap();
        }
        frontend
            .initialize_texture2d(render_tag!("streamed"), streamed)
            .unwrap();
        assert!(frontend.process(&mut backend).unwrap());
        backend.observed.clear();

        // A rewritten dynamic store reaches the backend as an update.
        frontend
            .texture2d_mut(streamed)
            .unwrap()
            .write(&[9; 4], 0)
            .unwrap();
        frontend
            .update_texture2d(render_tag!("streamed"), streamed)
            .unwrap();
        assert!(frontend.process(&mut backend).unwrap());
        let kinds: Vec<CommandKind> = backend.observed.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec![CommandKind::ResourceUpdate]);

        let sealed = frontend.create_texture2d(render_tag!("sealed")).unwrap();
        {
            let mut record = frontend.texture2d_mut(sealed).unwrap();
            record.record_kind(TextureKind::Static).unwrap();
            record.record_format(Format::RU8).unwrap();
            record.record_filter(Filter::default()).unwrap();
            record.record_wrap(Wrap2D::all(Wrap::ClampToEdge)).unwrap();
            record
                .record_dimensions(Extent2D {
                    width: 1,
                    height: 1,
                })
                .unwrap();
        }
        frontend
            .initialize_texture2d(render_tag!("sealed"), sealed)
            .unwrap();
        assert_eq!(
            frontend.update_texture2d(render_tag!("sealed"), sealed),
            Err(FrontendError::NotDynamic {
                kind: ResourceKind::Texture2D,
                index: sealed.0,
            })
        );

        let fresh = frontend.create_texture1d(render_tag!("fresh")).unwrap();
        assert_eq!(
            frontend.update_texture1d(render_tag!("fresh"), fresh),
            Err(FrontendError::NotReady {
                kind: ResourceKind::Texture1D,
                index: fresh.0,
            })
        );
    }

    #[test]
    fn empty_process_reports_no_work() {
        let frontend = frontend();
        let mut backend = NullBackend;
        assert!(!frontend.process(&mut backend).unwrap());
        frontend.swap(&mut backend);
        let stats = frontend.stats().unwrap();
        assert_eq!(stats.counters.swaps, 1);
        assert_eq!(stats.counters.frames, 0);
    }
}
