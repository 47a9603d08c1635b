//! Shader program descriptions and uniform dirty tracking.
//!
//! Uniform values live CPU-side in the program record; typed `record_*`
//! setters compare against the stored bytes and mark a dirty bit only on
//! real changes. A draw flushes the dirty set into its command payload as
//! self-describing records (`u32` index, `u32` length, value bytes), so the
//! backend replays exactly the uniforms that changed since the last draw
//! with this program.

use std::fmt;

use crate::bitset::Bitset;
use crate::error::FrontendError;
use crate::pool::PoolItem;
use crate::resource::{LifeState, ResourceKind};

/// Most bone matrices one program can carry.
pub const MAX_BONES: usize = 80;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ProgramError {
    #[error("program has no shader stages")]
    NoShaders,
    #[error("program already has a {kind} shader")]
    DuplicateShaderStage { kind: ShaderKind },
    #[error("no uniform at index {index}")]
    UnknownUniform { index: usize },
    #[error("uniform {index} is {got}, not {expected}")]
    KindMismatch {
        index: usize,
        expected: &'static str,
        got: UniformKind,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// One shader stage's source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shader {
    pub kind: ShaderKind,
    pub source: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Bool,
    I32,
    F32,
    Vec2I,
    Vec3I,
    Vec4I,
    Vec2F,
    Vec3F,
    Vec4F,
    Mat3x3F,
    Mat4x4F,
    /// 3x4 bone matrices, up to [`MAX_BONES`].
    Bones,
}

impl UniformKind {
    /// Byte size of the stored value.
    pub fn size(self) -> usize {
        match self {
            UniformKind::Sampler1D
            | UniformKind::Sampler2D
            | UniformKind::Sampler3D
            | UniformKind::SamplerCube
            | UniformKind::I32
            | UniformKind::F32 => 4,
            UniformKind::Bool => 1,
            UniformKind::Vec2I | UniformKind::Vec2F => 8,
            UniformKind::Vec3I | UniformKind::Vec3F => 12,
            UniformKind::Vec4I | UniformKind::Vec4F => 16,
            UniformKind::Mat3x3F => 36,
            UniformKind::Mat4x4F => 64,
            UniformKind::Bones => MAX_BONES * 48,
        }
    }

    fn is_sampler(self) -> bool {
        matches!(
            self,
            UniformKind::Sampler1D
                | UniformKind::Sampler2D
                | UniformKind::Sampler3D
                | UniformKind::SamplerCube
        )
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniformKind::Sampler1D => "sampler1D",
            UniformKind::Sampler2D => "sampler2D",
            UniformKind::Sampler3D => "sampler3D",
            UniformKind::SamplerCube => "samplerCM",
            UniformKind::Bool => "bool",
            UniformKind::I32 => "int",
            UniformKind::F32 => "float",
            UniformKind::Vec2I => "vec2i",
            UniformKind::Vec3I => "vec3i",
            UniformKind::Vec4I => "vec4i",
            UniformKind::Vec2F => "vec2f",
            UniformKind::Vec3F => "vec3f",
            UniformKind::Vec4F => "vec4f",
            UniformKind::Mat3x3F => "mat3x3f",
            UniformKind::Mat4x4F => "mat4x4f",
            UniformKind::Bones => "bones",
        };
        f.write_str(name)
    }
}

/// One named uniform and its current value bytes.
#[derive(Debug)]
pub struct Uniform {
    name: String,
    kind: UniformKind,
    value: Vec<u8>,
}

impl Uniform {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> UniformKind {
        self.kind
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// A shader program description.
#[derive(Debug, Default)]
pub struct Program {
    life: LifeState,
    shaders: Vec<Shader>,
    uniforms: Vec<Uniform>,
    dirty: Bitset,
}

impl Program {
    /// Add a shader stage; each stage kind at most once.
    pub fn add_shader(&mut self, shader: Shader) -> Result<(), ProgramError> {
        if self.shaders.iter().any(|s| s.kind == shader.kind) {
            return Err(ProgramError::DuplicateShaderStage { kind: shader.kind });
        }
        self.shaders.push(shader);
        Ok(())
    }

    /// Add a uniform and return its index. New uniforms start dirty so the
    /// first draw uploads them.
    pub fn add_uniform(&mut self, name: impl Into<String>, kind: UniformKind) -> usize {
        let index = self.uniforms.len();
        self.uniforms.push(Uniform {
            name: name.into(),
            kind,
            value: vec![0; kind.size()],
        });
        self.dirty.push(true);
        index
    }

    pub fn shaders(&self) -> &[Shader] {
        &self.shaders
    }

    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }

    fn check(
        &self,
        index: usize,
        accepts: fn(UniformKind) -> bool,
        expected: &'static str,
    ) -> Result<(), ProgramError> {
        let uniform = self
            .uniforms
            .get(index)
            .ok_or(ProgramError::UnknownUniform { index })?;
        if !accepts(uniform.kind) {
            return Err(ProgramError::KindMismatch {
                index,
                expected,
                got: uniform.kind,
            });
        }
        Ok(())
    }

    fn write_value(&mut self, index: usize, bytes: &[u8]) {
        let span = &mut self.uniforms[index].value[..bytes.len()];
        if span != bytes {
            span.copy_from_slice(bytes);
            self.dirty.set(index);
        }
    }

    pub fn record_sampler(&mut self, index: usize, unit: i32) -> Result<(), ProgramError> {
        self.check(index, UniformKind::is_sampler, "a sampler")?;
        self.write_value(index, bytemuck::bytes_of(&unit));
        Ok(())
    }

    pub fn record_bool(&mut self, index: usize, value: bool) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Bool, "bool")?;
        self.write_value(index, &[value as u8]);
        Ok(())
    }

    pub fn record_int(&mut self, index: usize, value: i32) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::I32, "int")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_float(&mut self, index: usize, value: f32) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::F32, "float")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_vec2i(&mut self, index: usize, value: [i32; 2]) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Vec2I, "vec2i")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_vec3i(&mut self, index: usize, value: [i32; 3]) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Vec3I, "vec3i")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_vec4i(&mut self, index: usize, value: [i32; 4]) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Vec4I, "vec4i")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_vec2f(&mut self, index: usize, value: [f32; 2]) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Vec2F, "vec2f")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_vec3f(&mut self, index: usize, value: [f32; 3]) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Vec3F, "vec3f")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_vec4f(&mut self, index: usize, value: [f32; 4]) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Vec4F, "vec4f")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_mat3x3f(
        &mut self,
        index: usize,
        value: [[f32; 3]; 3],
    ) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Mat3x3F, "mat3x3f")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn record_mat4x4f(
        &mut self,
        index: usize,
        value: [[f32; 4]; 4],
    ) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Mat4x4F, "mat4x4f")?;
        self.write_value(index, bytemuck::bytes_of(&value));
        Ok(())
    }

    /// Record bone matrices; joints beyond [`MAX_BONES`] are dropped.
    pub fn record_bones(
        &mut self,
        index: usize,
        joints: &[[[f32; 4]; 3]],
    ) -> Result<(), ProgramError> {
        self.check(index, |k| k == UniformKind::Bones, "bones")?;
        let count = joints.len().min(MAX_BONES);
        self.write_value(index, bytemuck::cast_slice(&joints[..count]));
        Ok(())
    }

    /// Bytes a flush of the currently dirty uniforms will occupy.
    pub fn dirty_uniforms_byte_size(&self) -> usize {
        self.dirty
            .iter_set()
            .map(|index| 8 + self.uniforms[index].value.len())
            .sum()
    }

    /// Write the dirty uniforms into `out` as `(u32 index, u32 len, bytes)`
    /// records and clear the dirty set. `out` must be exactly
    /// [`dirty_uniforms_byte_size`](Self::dirty_uniforms_byte_size) long.
    pub fn flush_dirty_uniforms(&mut self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.dirty_uniforms_byte_size());
        let mut cursor = 0;
        for index in self.dirty.iter_set() {
            let value = &self.uniforms[index].value;
            out[cursor..cursor + 4].copy_from_slice(&(index as u32).to_le_bytes());
            out[cursor + 4..cursor + 8].copy_from_slice(&(value.len() as u32).to_le_bytes());
            out[cursor + 8..cursor + 8 + value.len()].copy_from_slice(value);
            cursor += 8 + value.len();
        }
        self.dirty.clear_all();
    }

    pub fn dirty_uniforms(&self) -> usize {
        self.dirty.count_set()
    }

    /// Check the description is complete.
    pub fn validate(&self) -> Result<(), FrontendError> {
        if self.shaders.is_empty() {
            return Err(ProgramError::NoShaders.into());
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

impl PoolItem for Program {
    const KIND: ResourceKind = ResourceKind::Program;

    fn byte_usage(&self) -> usize {
        let shaders: usize = self.shaders.iter().map(|s| s.source.len()).sum();
        let uniforms: usize = self.uniforms.iter().map(|u| u.value.len()).sum();
        shaders + uniforms
    }
}

/// Iterator over the records written by
/// [`Program::flush_dirty_uniforms`].
pub struct UniformRecords<'a> {
    bytes: &'a [u8],
}

/// One flushed uniform: its index in the program and its value bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformRecord<'a> {
    pub index: u32,
    pub data: &'a [u8],
}

impl<'a> UniformRecords<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl<'a> Iterator for UniformRecords<'a> {
    type Item = UniformRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.len() < 8 {
            return None;
        }
        let index = u32::from_le_bytes(self.bytes[0..4].try_into().ok()?);
        let len = u32::from_le_bytes(self.bytes[4..8].try_into().ok()?) as usize;
        let data = self.bytes.get(8..8 + len)?;
        self.bytes = &self.bytes[8 + len..];
        Some(UniformRecord { index, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flushed(program: &mut Program) -> Vec<(u32, Vec<u8>)> {
        let mut out = vec![0; program.dirty_uniforms_byte_size()];
        program.flush_dirty_uniforms(&mut out);
        UniformRecords::new(&out)
            .map(|record| (record.index, record.data.to_vec()))
            .collect()
    }

    #[test]
    fn new_uniforms_start_dirty() {
        let mut program = Program::default();
        program.add_uniform("u_transform", UniformKind::Mat4x4F);
        program.add_uniform("u_lit", UniformKind::Bool);
        assert_eq!(program.dirty_uniforms(), 2);

        let records = flushed(&mut program);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 0);
        assert_eq!(records[0].1.len(), 64);
        assert_eq!(records[1].0, 1);
        assert_eq!(records[1].1, vec![0]);
        assert_eq!(program.dirty_uniforms(), 0);
    }

    #[test]
    fn unchanged_values_do_not_redirty() {
        let mut program = Program::default();
        let scale = program.add_uniform("u_scale", UniformKind::F32);
        flushed(&mut program);

        program.record_float(scale, 0.0).unwrap();
        assert_eq!(program.dirty_uniforms(), 0);

        program.record_float(scale, 2.5).unwrap();
        assert_eq!(program.dirty_uniforms(), 1);
        let records = flushed(&mut program);
        assert_eq!(records[0].1, bytemuck::bytes_of(&2.5_f32).to_vec());

        // Recording the same value again stays clean.
        program.record_float(scale, 2.5).unwrap();
        assert_eq!(program.dirty_uniforms(), 0);
    }

    #[test]
    fn typed_setters_reject_wrong_kinds() {
        let mut program = Program::default();
        let color = program.add_uniform("u_color", UniformKind::Vec4F);
        assert_eq!(
            program.record_int(color, 1),
            Err(ProgramError::KindMismatch {
                index: color,
                expected: "int",
                got: UniformKind::Vec4F,
            })
        );
        assert_eq!(
            program.record_float(9, 1.0),
            Err(ProgramError::UnknownUniform { index: 9 })
        );
    }

    #[test]
    fn samplers_accept_any_sampler_kind() {
        let mut program = Program::default();
        let albedo = program.add_uniform("u_albedo", UniformKind::Sampler2D);
        let sky = program.add_uniform("u_sky", UniformKind::SamplerCube);
        flushed(&mut program);
        program.record_sampler(albedo, 0).unwrap();
        program.record_sampler(sky, 1).unwrap();
        assert_eq!(program.dirty_uniforms(), 1);
        // Unit 0 matched the zero-initialized store; unit 1 did not.
        let records = flushed(&mut program);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, sky as u32);
    }

    #[test]
    fn dirty_tracking_works_past_sixty_four_uniforms() {
        let mut program = Program::default();
        for i in 0..70 {
            program.add_uniform(format!("u_{i}"), UniformKind::F32);
        }
        flushed(&mut program);
        assert_eq!(program.dirty_uniforms(), 0);

        program.record_float(68, 1.0).unwrap();
        program.record_float(3, 1.0).unwrap();
        let records = flushed(&mut program);
        let indices: Vec<u32> = records.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![3, 68]);
    }

    #[test]
    fn bones_clamp_to_the_cap() {
        let mut program = Program::default();
        let bones = program.add_uniform("u_bones", UniformKind::Bones);
        flushed(&mut program);

        let joints = vec![[[1.0_f32; 4]; 3]; MAX_BONES + 5];
        program.record_bones(bones, &joints).unwrap();
        let records = flushed(&mut program);
        assert_eq!(records[0].1.len(), MAX_BONES * 48);
        assert_eq!(program.uniforms()[bones].value().len(), MAX_BONES * 48);
    }

    #[test]
    fn shader_stages_are_unique() {
        let mut program = Program::default();
        program
            .add_shader(Shader {
                kind: ShaderKind::Vertex,
                source: "void main() {}".into(),
            })
            .unwrap();
        assert_eq!(
            program.add_shader(Shader {
                kind: ShaderKind::Vertex,
                source: "void main() {}".into(),
            }),
            Err(ProgramError::DuplicateShaderStage {
                kind: ShaderKind::Vertex
            })
        );
        program.validate().unwrap();
    }

    #[test]
    fn validate_requires_a_shader() {
        let program = Program::default();
        assert_eq!(
            program.validate(),
            Err(FrontendError::Program(ProgramError::NoShaders))
        );
    }

    #[test]
    fn uniforms_found_by_name() {
        let mut program = Program::default();
        program.add_uniform("u_first", UniformKind::F32);
        let second = program.add_uniform("u_second", UniformKind::I32);
        assert_eq!(program.uniform_index("u_second"), Some(second));
        assert_eq!(program.uniform_index("u_missing"), None);
    }
}
