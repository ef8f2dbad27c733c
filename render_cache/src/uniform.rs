// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::buffer_texture::BufferTexture;
use crate::context::Context;
use crate::gl::*;
use crate::program::Program;
use crate::qualifier::Qualified;
use crate::texture::{SampledTexture, Texture2d, Texture2dArray};
use glam::{IVec2, Mat4, Vec2, Vec3, Vec4};
use std::marker::PhantomData;
use std::rc::Rc;
use std::slice;

/// A type that can be uploaded as a glsl uniform.
pub trait UniformValue: Copy + PartialEq {
    /// Flattens `values` for the driver.
    fn data(values: &[Self]) -> UniformData<'_>;
}

impl UniformValue for f32 {
    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::Float(values)
    }
}

impl UniformValue for i32 {
    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::Int(values)
    }
}

impl UniformValue for Vec2 {
    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::Vec2(bytemuck::cast_slice(values))
    }
}

impl UniformValue for Vec3 {
    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::Vec3(bytemuck::cast_slice(values))
    }
}

impl UniformValue for Vec4 {
    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::Vec4(bytemuck::cast_slice(values))
    }
}

impl UniformValue for IVec2 {
    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::IVec2(bytemuck::cast_slice(values))
    }
}

impl UniformValue for Mat4 {
    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::Mat4(bytemuck::cast_slice(values))
    }
}

/// Where a uniform lives.
struct Binding<G: GlApi> {
    name: String,
    context: Rc<Context<G>>,
    program: Qualified,
    location: Option<u32>,
}

impl<G: GlApi> Binding<G> {
    fn new(name: &str, program: &Program<G>) -> Self {
        Self {
            name: name.to_owned(),
            context: Rc::clone(program.context()),
            program: program.handle(),
            location: program.uniform_location(name),
        }
    }
}

/// Last value sent.
#[derive(Clone, Debug, PartialEq)]
enum Sent<T> {
    Scalar(T),
    Vector(Vec<T>),
}

/// A uniform that remembers what it last uploaded, so setting the same value every frame only
/// reaches the driver once.
pub struct Uniform<G: GlApi, T: UniformValue> {
    binding: Option<Binding<G>>,
    sent: Option<Sent<T>>,
}

impl<G: GlApi, T: UniformValue> Default for Uniform<G, T> {
    fn default() -> Self {
        Self {
            binding: None,
            sent: None,
        }
    }
}

impl<G: GlApi, T: UniformValue> Uniform<G, T> {
    /// Creates an uninitialized uniform. Values set before [`initialize`][`Self::initialize`] are
    /// uploaded by it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `name` in `program`. Calling it again with a reloaded program resolves it there
    /// and uploads the last value, since a new program starts out with none.
    pub fn initialize(&mut self, name: &str, program: &Program<G>) {
        self.binding = Some(Binding::new(name, program));
        if self.sent.is_some() {
            self.upload();
        }
    }

    /// Sets a single value.
    pub fn set(&mut self, value: T) {
        if let Some(Sent::Scalar(sent)) = &self.sent {
            if *sent == value {
                return;
            }
        }
        self.sent = Some(Sent::Scalar(value));
        self.upload();
    }

    /// Sets an array of values.
    pub fn set_slice(&mut self, values: &[T]) {
        match &mut self.sent {
            Some(Sent::Vector(sent)) if sent.as_slice() == values => return,
            // Reuse the allocation.
            Some(Sent::Vector(sent)) if sent.len() == values.len() => sent.copy_from_slice(values),
            sent => *sent = Some(Sent::Vector(values.to_vec())),
        }
        self.upload();
    }

    /// The last value set with [`set`][`Self::set`].
    pub fn get(&self) -> Option<T> {
        match &self.sent {
            Some(Sent::Scalar(value)) => Some(*value),
            _ => None,
        }
    }

    fn upload(&self) {
        let (binding, sent) = match (&self.binding, &self.sent) {
            (Some(binding), Some(sent)) => (binding, sent),
            _ => return,
        };
        let location = match binding.location {
            Some(location) => location,
            None => return,
        };

        let data = match sent {
            Sent::Scalar(value) => T::data(slice::from_ref(value)),
            Sent::Vector(values) => T::data(values),
        };
        binding.context.use_program(binding.program);
        binding.context.tally_uniform_bytes(data.byte_len());
        binding.context.gl().uniform(location, data);
    }
}

/// A `sampler*` uniform (or array of them). Each element gets its own texture unit.
pub struct Sampler<G: GlApi, T> {
    binding: Option<Binding<G>>,
    units: Vec<u32>,
    texture: PhantomData<fn(&T)>,
}

/// A `sampler2D`.
pub type Sampler2d<G> = Sampler<G, Texture2d<G>>;
/// A `sampler2DArray`.
pub type Sampler2dArray<G> = Sampler<G, Texture2dArray<G>>;
/// A `samplerBuffer`.
pub type SamplerBuffer<G> = Sampler<G, BufferTexture<G>>;

impl<G: GlApi, T: SampledTexture> Default for Sampler<G, T> {
    fn default() -> Self {
        Self {
            binding: None,
            units: Vec::new(),
            texture: PhantomData,
        }
    }
}

impl<G: GlApi, T: SampledTexture> Sampler<G, T> {
    /// Creates an uninitialized sampler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `count` texture units of `program` the first time. Later calls (with a reloaded
    /// program) keep the same units, and must pass the same `name` and `count`. Either way the
    /// units are uploaded to `name`.
    pub fn initialize(&mut self, name: &str, count: usize, program: &Program<G>) {
        if let Some(previous) = &self.binding {
            assert_eq!(previous.name, name, "sampler renamed on refresh");
            assert_eq!(
                self.units.len(),
                count,
                "sampler {} resized on refresh",
                name
            );
        } else {
            self.units = (0..count).map(|_| program.next_sampler()).collect();
        }

        let binding = Binding::new(name, program);
        if let Some(location) = binding.location {
            let units: Vec<i32> = self.units.iter().map(|&u| u as i32).collect();
            let data = UniformData::Int(&units);
            binding.context.use_program(binding.program);
            binding.context.tally_uniform_bytes(data.byte_len());
            binding.context.gl().uniform(location, data);
        }
        self.binding = Some(binding);
    }

    /// Binds `texture` to element `index`.
    pub fn set(&self, texture: &T, index: usize) {
        let len = self.units.len();
        assert!(index < len, "sampler index {} out of range", index);
        if let Some(binding) = &self.binding {
            binding.context.use_program(binding.program);
            binding
                .context
                .bind_texture(texture.handle(), T::TARGET, self.units[index]);
        }
    }

    /// Texture units, by element.
    pub fn units(&self) -> &[u32] {
        &self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ShaderVersion;
    use crate::testing::{Call, RecordingGl, Upload};
    use crate::texture::TextureFormat;
    use glam::UVec2;

    fn program() -> (Rc<Context<RecordingGl>>, Program<RecordingGl>) {
        let context = Context::new(RecordingGl::default(), ShaderVersion::Glsl330);
        let program = Program::load(&context, "void main() {}", "void main() {}").unwrap();
        context.gl().take_calls();
        (context, program)
    }

    fn uploads(context: &Context<RecordingGl>) -> Vec<Upload> {
        context
            .gl()
            .take_calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Uniform(_, upload) => Some(upload),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_set_dedup() {
        let (context, program) = program();
        let mut uniform = Uniform::<_, f32>::new();
        uniform.initialize("uAlpha", &program);
        uniform.set(1.0);
        uniform.set(1.0);
        uniform.set(2.0);
        assert_eq!(
            uploads(&context),
            vec![Upload::Float(vec![1.0]), Upload::Float(vec![2.0])]
        );
        assert_eq!(uniform.get(), Some(2.0));

        let frame = context.this_frame();
        assert_eq!(frame.set_uniform_calls, 2);
        assert_eq!(frame.uniform_bytes, 8);
        assert_eq!(frame.program_switches, 1);
    }

    #[test]
    fn test_shape_change() {
        let (context, program) = program();
        let mut uniform = Uniform::<_, Vec2>::new();
        uniform.initialize("uOffsets", &program);

        uniform.set(Vec2::ONE);
        // Same contents, other shape.
        uniform.set_slice(&[Vec2::ONE]);
        uniform.set_slice(&[Vec2::ONE]);
        uniform.set_slice(&[Vec2::ZERO]);
        uniform.set_slice(&[Vec2::ZERO, Vec2::ONE]);
        assert_eq!(
            uploads(&context),
            vec![
                Upload::Float(vec![1.0, 1.0]),
                Upload::Float(vec![1.0, 1.0]),
                Upload::Float(vec![0.0, 0.0]),
                Upload::Float(vec![0.0, 0.0, 1.0, 1.0]),
            ]
        );
    }

    #[test]
    fn test_initialize_reuploads() {
        let (context, program) = program();
        let mut uniform = Uniform::<_, i32>::new();
        // Nothing to upload to yet.
        uniform.set(3);
        assert!(uploads(&context).is_empty());

        uniform.initialize("uMode", &program);
        assert_eq!(uploads(&context), vec![Upload::Int(vec![3])]);

        let reloaded = program.reload().unwrap();
        context.gl().take_calls();
        uniform.initialize("uMode", &reloaded);
        assert_eq!(
            context.gl().take_calls(),
            vec![
                Call::UseProgram(reloaded.handle().raw),
                Call::Uniform(
                    reloaded.uniform_location("uMode").unwrap(),
                    Upload::Int(vec![3])
                ),
            ]
        );
    }

    #[test]
    fn test_missing_uniform() {
        let (context, program) = program();
        let mut uniform = Uniform::<_, Mat4>::new();
        uniform.initialize("unusedMatrix", &program);
        uniform.set(Mat4::IDENTITY);
        assert!(context.gl().take_calls().is_empty());
    }

    #[test]
    fn test_sampler() {
        let (context, program) = program();
        let format = TextureFormat {
            size: UVec2::new(2, 2),
            ..Default::default()
        };
        let a = Texture2d::make(&context, format, None).unwrap();
        let b = Texture2d::make(&context, format, None).unwrap();
        context.gl().take_calls();

        let mut sampler = Sampler2d::new();
        sampler.initialize("uTextures", 2, &program);
        assert_eq!(sampler.units(), &[0, 1]);
        assert_eq!(uploads(&context), vec![Upload::Int(vec![0, 1])]);

        sampler.set(&a, 1);
        sampler.set(&a, 1);
        // Still bound to unit 0 from when it was made.
        sampler.set(&b, 0);
        assert_eq!(
            context.gl().take_calls(),
            vec![
                Call::ActiveTexture(1),
                Call::BindTexture(TextureTarget::Texture2d, 1),
            ]
        );

        // Reloading keeps the units.
        let reloaded = program.reload().unwrap();
        sampler.initialize("uTextures", 2, &reloaded);
        assert_eq!(sampler.units(), &[0, 1]);
    }

    #[test]
    #[should_panic]
    fn test_sampler_resized_on_refresh() {
        let (_context, program) = program();
        let mut sampler = Sampler2d::new();
        sampler.initialize("uTextures", 2, &program);
        let reloaded = program.reload().unwrap();
        sampler.initialize("uTextures", 3, &reloaded);
    }

    #[test]
    #[should_panic]
    fn test_sampler_renamed_on_refresh() {
        let (_context, program) = program();
        let mut sampler = Sampler2d::new();
        sampler.initialize("uTextures", 2, &program);
        sampler.initialize("uOther", 2, &program);
    }

    #[test]
    fn test_empty_sampler_refresh() {
        let (_context, program) = program();
        let mut sampler = Sampler2d::new();
        sampler.initialize("uTextures", 0, &program);
        sampler.initialize("uTextures", 0, &program);
        assert!(sampler.units().is_empty());
        // No units were reserved by either call.
        assert_eq!(program.next_sampler(), 0);
    }

    #[test]
    #[should_panic]
    fn test_sampler_index_out_of_range() {
        let (context, program) = program();
        let texture = Texture2d::make(&context, TextureFormat::default(), None).unwrap();
        let mut sampler = Sampler2d::new();
        sampler.initialize("uTexture", 1, &program);
        sampler.set(&texture, 1);
    }
}
