// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The boundary to the native graphics driver. Everything above this module deals in
//! [`Qualified`][`crate::Qualified`] handles and typed enums; everything below it is a
//! one-to-one call into the driver.

use crate::buffer_texture::BufferTextureFormat;
use crate::configuration::{BlendEquation, BlendFunc, DepthFunc, PolygonMode};
use crate::texture::{PixelFormat, TextureFormat};
use glam::{IVec4, Vec4};

/// Raw numeric values of the driver enums, as defined by the OpenGL (ES) headers.
#[allow(missing_docs)]
pub mod consts {
    pub const ZERO: u32 = 0;
    pub const ONE: u32 = 1;

    pub const POINTS: u32 = 0x0000;
    pub const LINES: u32 = 0x0001;
    pub const TRIANGLES: u32 = 0x0004;
    pub const TRIANGLE_STRIP: u32 = 0x0005;

    pub const SRC_ALPHA: u32 = 0x0302;
    pub const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
    pub const ONE_MINUS_DST_ALPHA: u32 = 0x0305;
    pub const DST_COLOR: u32 = 0x0306;

    pub const LESS: u32 = 0x0201;
    pub const LEQUAL: u32 = 0x0203;
    pub const ALWAYS: u32 = 0x0207;

    pub const FRONT_AND_BACK: u32 = 0x0408;
    pub const CULL_FACE: u32 = 0x0B44;
    pub const DEPTH_TEST: u32 = 0x0B71;
    pub const BLEND: u32 = 0x0BE2;
    pub const FRAMEBUFFER_SRGB: u32 = 0x8DB9;

    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE_3D: u32 = 0x806F;
    pub const TEXTURE_2D_ARRAY: u32 = 0x8C1A;
    pub const TEXTURE_CUBE_MAP: u32 = 0x8513;
    pub const TEXTURE_BUFFER: u32 = 0x8C2A;
    pub const TEXTURE0: u32 = 0x84C0;

    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const HALF_FLOAT: u32 = 0x140B;

    pub const RED: u32 = 0x1903;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const R8: u32 = 0x8229;
    pub const R16: u32 = 0x822A;
    pub const R16F: u32 = 0x822D;
    pub const R32F: u32 = 0x822E;
    pub const RGB16: u32 = 0x8054;
    pub const RGBA8: u32 = 0x8058;
    pub const RGBA32F: u32 = 0x8814;
    pub const RGB32F: u32 = 0x8815;
    pub const RGB32UI: u32 = 0x8D71;
    pub const RGB32I: u32 = 0x8D83;

    pub const POINT: u32 = 0x1B00;
    pub const LINE: u32 = 0x1B01;
    pub const FILL: u32 = 0x1B02;

    pub const NEAREST: u32 = 0x2600;
    pub const LINEAR: u32 = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;
    pub const REPEAT: u32 = 0x2901;
    pub const CLAMP_TO_BORDER: u32 = 0x812D;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const MIRRORED_REPEAT: u32 = 0x8370;

    pub const FUNC_ADD: u32 = 0x8006;
    pub const MIN: u32 = 0x8007;
    pub const MAX: u32 = 0x8008;
    pub const FUNC_SUBTRACT: u32 = 0x800A;
    pub const FUNC_REVERSE_SUBTRACT: u32 = 0x800B;

    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
    pub const PIXEL_PACK_BUFFER: u32 = 0x88EB;
    pub const PIXEL_UNPACK_BUFFER: u32 = 0x88EC;
    pub const UNIFORM_BUFFER: u32 = 0x8A11;
    pub const TRANSFORM_FEEDBACK_BUFFER: u32 = 0x8C8E;
    pub const COPY_READ_BUFFER: u32 = 0x8F36;
    pub const COPY_WRITE_BUFFER: u32 = 0x8F37;
    pub const DRAW_INDIRECT_BUFFER: u32 = 0x8F3F;
    pub const SHADER_STORAGE_BUFFER: u32 = 0x90D2;

    pub const STREAM_DRAW: u32 = 0x88E0;
    pub const STREAM_READ: u32 = 0x88E1;
    pub const STREAM_COPY: u32 = 0x88E2;
    pub const STATIC_DRAW: u32 = 0x88E4;
    pub const STATIC_READ: u32 = 0x88E5;
    pub const STATIC_COPY: u32 = 0x88E6;
    pub const DYNAMIC_DRAW: u32 = 0x88E8;
    pub const DYNAMIC_READ: u32 = 0x88E9;
    pub const DYNAMIC_COPY: u32 = 0x88EA;

    pub const FRAMEBUFFER: u32 = 0x8D40;
    pub const COLOR_ATTACHMENT0: u32 = 0x8CE0;
    pub const DEPTH_ATTACHMENT: u32 = 0x8D00;
    pub const STENCIL_ATTACHMENT: u32 = 0x8D20;
    pub const DEPTH_STENCIL_ATTACHMENT: u32 = 0x821A;
}

use consts::*;

/// A binding point for buffers. The context caches one bound buffer per target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Vertex attributes.
    Array,
    /// Vertex indices.
    Element,
    /// Source of buffer to buffer copies.
    CopyRead,
    /// Destination of buffer to buffer copies.
    CopyWrite,
    /// Pixel read back (see [`PixelBuffer`][`crate::PixelBuffer`]).
    PixelPack,
    /// Pixel upload.
    PixelUnpack,
    /// Storage of a [`BufferTexture`][`crate::BufferTexture`].
    Texture,
    /// Uniform blocks.
    Uniform,
    /// Transform feedback output.
    TransformFeedback,
    /// Indirect draw parameters.
    DrawIndirect,
    /// Shader storage blocks.
    ShaderStorage,
}

impl BufferTarget {
    /// How many targets there are.
    pub const COUNT: usize = 11;

    /// Every target, in [`Self::index`] order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Array,
        Self::Element,
        Self::CopyRead,
        Self::CopyWrite,
        Self::PixelPack,
        Self::PixelUnpack,
        Self::Texture,
        Self::Uniform,
        Self::TransformFeedback,
        Self::DrawIndirect,
        Self::ShaderStorage,
    ];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Array => ARRAY_BUFFER,
            Self::Element => ELEMENT_ARRAY_BUFFER,
            Self::CopyRead => COPY_READ_BUFFER,
            Self::CopyWrite => COPY_WRITE_BUFFER,
            Self::PixelPack => PIXEL_PACK_BUFFER,
            Self::PixelUnpack => PIXEL_UNPACK_BUFFER,
            Self::Texture => TEXTURE_BUFFER,
            Self::Uniform => UNIFORM_BUFFER,
            Self::TransformFeedback => TRANSFORM_FEEDBACK_BUFFER,
            Self::DrawIndirect => DRAW_INDIRECT_BUFFER,
            Self::ShaderStorage => SHADER_STORAGE_BUFFER,
        }
    }
}

impl Default for BufferTarget {
    fn default() -> Self {
        Self::Array
    }
}

/// How often a buffer is expected to be written and read.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum BufferUsage {
    StreamDraw,
    StreamRead,
    StreamCopy,
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

impl BufferUsage {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::StreamDraw => STREAM_DRAW,
            Self::StreamRead => STREAM_READ,
            Self::StreamCopy => STREAM_COPY,
            Self::StaticDraw => STATIC_DRAW,
            Self::StaticRead => STATIC_READ,
            Self::StaticCopy => STATIC_COPY,
            Self::DynamicDraw => DYNAMIC_DRAW,
            Self::DynamicRead => DYNAMIC_READ,
            Self::DynamicCopy => DYNAMIC_COPY,
        }
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::StaticDraw
    }
}

/// What a texture unit is bound as. A unit can only hold one target at a time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TextureTarget {
    /// `sampler2D`.
    Texture2d,
    /// `sampler3D`.
    Texture3d,
    /// `sampler2DArray`.
    Texture2dArray,
    /// `samplerCube`.
    CubeMap,
    /// `samplerBuffer`.
    Buffer,
}

impl TextureTarget {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Texture2d => TEXTURE_2D,
            Self::Texture3d => TEXTURE_3D,
            Self::Texture2dArray => TEXTURE_2D_ARRAY,
            Self::CubeMap => TEXTURE_CUBE_MAP,
            Self::Buffer => TEXTURE_BUFFER,
        }
    }
}

/// A texture parameter set with [`GlApi::tex_parameter`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum TextureParameter {
    MinFilter,
    MagFilter,
    WrapS,
    WrapT,
}

impl TextureParameter {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::MinFilter => TEXTURE_MIN_FILTER,
            Self::MagFilter => TEXTURE_MAG_FILTER,
            Self::WrapS => TEXTURE_WRAP_S,
            Self::WrapT => TEXTURE_WRAP_T,
        }
    }
}

/// A toggleable piece of global driver state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Capability {
    Blend,
    DepthTest,
    FramebufferSrgb,
}

impl Capability {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Blend => BLEND,
            Self::DepthTest => DEPTH_TEST,
            Self::FramebufferSrgb => FRAMEBUFFER_SRGB,
        }
    }
}

/// A framebuffer attachment point.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Attachment {
    /// `GL_COLOR_ATTACHMENTi` for `i` in `0..10`.
    Color(u8),
    #[allow(missing_docs)]
    Depth,
    #[allow(missing_docs)]
    Stencil,
    #[allow(missing_docs)]
    DepthStencil,
}

impl Attachment {
    /// The underlying driver enum.
    pub fn to_gl(self) -> u32 {
        match self {
            Self::Color(i) => {
                assert!(i < 10, "only 10 color attachments supported");
                COLOR_ATTACHMENT0 + i as u32
            }
            Self::Depth => DEPTH_ATTACHMENT,
            Self::Stencil => STENCIL_ATTACHMENT,
            Self::DepthStencil => DEPTH_STENCIL_ATTACHMENT,
        }
    }
}

/// What vertices are assembled into.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Primitive {
    Points,
    Lines,
    Triangles,
    TriangleStrip,
}

impl Primitive {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Points => POINTS,
            Self::Lines => LINES,
            Self::Triangles => TRIANGLES,
            Self::TriangleStrip => TRIANGLE_STRIP,
        }
    }
}

/// The contents of a uniform upload, already flattened to scalars.
#[derive(Copy, Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum UniformData<'a> {
    Float(&'a [f32]),
    Vec2(&'a [f32]),
    Vec3(&'a [f32]),
    Vec4(&'a [f32]),
    Int(&'a [i32]),
    IVec2(&'a [i32]),
    Mat4(&'a [f32]),
}

impl UniformData<'_> {
    /// Size of the upload in bytes.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Float(v) | Self::Vec2(v) | Self::Vec3(v) | Self::Vec4(v) | Self::Mat4(v) => {
                std::mem::size_of_val(*v)
            }
            Self::Int(v) | Self::IVec2(v) => std::mem::size_of_val(*v),
        }
    }
}

/// A native graphics driver. Handles are raw `u32` names where `0` means "none". Drivers reuse
/// names of deleted objects, which is why the rest of the crate pairs them with a
/// [`Qualifier`][`crate::Qualifier`].
///
/// Implementations are expected to be dumb: no caching, no validation. Every method maps onto
/// exactly one driver call (or a short fixed sequence for compile/link).
pub trait GlApi {
    /// `GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS`.
    fn max_combined_texture_units(&self) -> u32;
    /// `GL_MAX_TEXTURE_SIZE`.
    fn max_texture_size(&self) -> u32;

    /// `glEnable`.
    fn enable(&self, capability: Capability);
    /// `glDisable`.
    fn disable(&self, capability: Capability);
    /// `glBlendFunc` or `glBlendFuncSeparate`.
    fn blend_func(&self, func: BlendFunc);
    /// `glBlendEquation`.
    fn blend_equation(&self, equation: BlendEquation);
    /// `glDepthFunc`.
    fn depth_func(&self, func: DepthFunc);
    /// `glDepthMask`.
    fn depth_mask(&self, write: bool);
    /// `glPolygonMode(GL_FRONT_AND_BACK, ...)`.
    fn polygon_mode(&self, mode: PolygonMode);
    /// `glViewport` with `(x, y, width, height)`.
    fn viewport(&self, viewport: IVec4);
    /// `glClearColor` followed by `glClear`.
    fn clear(&self, color: Vec4, depth: bool);

    /// `glGenBuffers`.
    fn create_buffer(&self) -> u32;
    /// `glDeleteBuffers`.
    fn delete_buffer(&self, buffer: u32);
    /// `glBindBuffer`.
    fn bind_buffer(&self, target: BufferTarget, buffer: u32);
    /// `glBufferData`. Allocates `size` bytes, filled from `data` if provided.
    fn buffer_data(
        &self,
        target: BufferTarget,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    );
    /// `glMapBuffer(target, GL_READ_ONLY)`, copied out.
    fn map_buffer(&self, target: BufferTarget, size: usize) -> Option<Vec<u8>>;
    /// `glUnmapBuffer`.
    fn unmap_buffer(&self, target: BufferTarget);

    /// `glGenVertexArrays`.
    fn create_vertex_array(&self) -> u32;
    /// `glDeleteVertexArrays`.
    fn delete_vertex_array(&self, vertex_array: u32);
    /// `glBindVertexArray`.
    fn bind_vertex_array(&self, vertex_array: u32);
    /// `glDrawArraysInstanced` (or `glDrawArrays` if `instances` is 1).
    fn draw_arrays(&self, primitive: Primitive, first: u32, count: u32, instances: u32);

    /// `glGenTextures`.
    fn create_texture(&self) -> u32;
    /// `glDeleteTextures`.
    fn delete_texture(&self, texture: u32);
    /// `glActiveTexture(GL_TEXTURE0 + unit)`.
    fn active_texture(&self, unit: u32);
    /// `glBindTexture`.
    fn bind_texture(&self, target: TextureTarget, texture: u32);
    /// Allocates the bound texture. `glTexImage2D` of level 0, or `glTexStorage3D` of all
    /// `format.mipmap_levels` levels if `format.layers` is non-zero.
    fn tex_image(&self, target: TextureTarget, format: &TextureFormat, data: Option<&[u8]>);
    /// `glTexParameteri`.
    fn tex_parameter(&self, target: TextureTarget, parameter: TextureParameter, value: u32);
    /// `glGenerateMipmap`.
    fn generate_mipmap(&self, target: TextureTarget);
    /// `glTexBuffer(GL_TEXTURE_BUFFER, ...)` on the bound buffer texture.
    fn tex_buffer(&self, format: BufferTextureFormat, buffer: u32);
    /// `glGetTexImage` into the bound pixel pack buffer.
    fn get_tex_image(&self, target: TextureTarget, level: u32, format: PixelFormat);

    /// `glGenFramebuffers`.
    fn create_framebuffer(&self) -> u32;
    /// `glDeleteFramebuffers`.
    fn delete_framebuffer(&self, framebuffer: u32);
    /// `glBindFramebuffer(GL_FRAMEBUFFER, ...)`.
    fn bind_framebuffer(&self, framebuffer: u32);
    /// `glFramebufferTexture` on the bound framebuffer.
    fn framebuffer_texture(&self, attachment: Attachment, texture: u32, level: u32);
    /// `glFramebufferTextureLayer` on the bound framebuffer.
    fn framebuffer_texture_layer(
        &self,
        attachment: Attachment,
        texture: u32,
        level: u32,
        layer: u32,
    );

    /// Compiles both stages and links them. Returns the info logs on failure.
    fn create_program(&self, vertex: &str, fragment: &str) -> Result<u32, String>;
    /// `glDeleteProgram`.
    fn delete_program(&self, program: u32);
    /// `glUseProgram`.
    fn use_program(&self, program: u32);
    /// `glGetUniformLocation`, `None` if the uniform doesn't exist or isn't in use.
    fn uniform_location(&self, program: u32, name: &str) -> Option<u32>;
    /// `glUniform*v` on the current program.
    fn uniform(&self, location: u32, data: UniformData);
}
