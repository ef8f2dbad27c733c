// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! A fake driver for tests. Records every call and hands out raw names like a real driver,
//! reusing the most recently freed one first.

use crate::buffer_texture::BufferTextureFormat;
use crate::configuration::{BlendEquation, BlendFunc, DepthFunc, PolygonMode};
use crate::gl::*;
use crate::texture::{PixelFormat, TextureFormat};
use glam::{IVec4, UVec2, Vec4};
use std::cell::RefCell;

/// Uniform contents, owned.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Upload {
    Float(Vec<f32>),
    Int(Vec<i32>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Enable(Capability),
    Disable(Capability),
    BlendFunc(BlendFunc),
    BlendEquation(BlendEquation),
    DepthFunc(DepthFunc),
    DepthMask(bool),
    PolygonMode(PolygonMode),
    Viewport(IVec4),
    Clear(Vec4, bool),
    CreateBuffer(u32),
    DeleteBuffer(u32),
    BindBuffer(BufferTarget, u32),
    BufferData(BufferTarget, usize, BufferUsage),
    MapBuffer(BufferTarget, usize),
    UnmapBuffer(BufferTarget),
    CreateVertexArray(u32),
    DeleteVertexArray(u32),
    BindVertexArray(u32),
    DrawArrays(Primitive, u32, u32, u32),
    CreateTexture(u32),
    DeleteTexture(u32),
    ActiveTexture(u32),
    BindTexture(TextureTarget, u32),
    TexImage(TextureTarget, UVec2, u32),
    TexParameter(TextureTarget, TextureParameter, u32),
    GenerateMipmap(TextureTarget),
    TexBuffer(BufferTextureFormat, u32),
    GetTexImage(TextureTarget, u32, PixelFormat),
    CreateFramebuffer(u32),
    DeleteFramebuffer(u32),
    BindFramebuffer(u32),
    FramebufferTexture(Attachment, u32, u32),
    FramebufferTextureLayer(Attachment, u32, u32, u32),
    CreateProgram(u32),
    DeleteProgram(u32),
    UseProgram(u32),
    Uniform(u32, Upload),
}

/// Raw names of one kind of object.
#[derive(Default)]
struct Names {
    next: u32,
    free: Vec<u32>,
}

impl Names {
    fn create(&mut self) -> u32 {
        self.free.pop().unwrap_or_else(|| {
            self.next += 1;
            self.next
        })
    }

    fn delete(&mut self, name: u32) {
        assert_ne!(name, 0, "deleted name 0");
        assert!(!self.free.contains(&name), "double delete of {}", name);
        self.free.push(name);
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    buffers: Names,
    vertex_arrays: Names,
    textures: Names,
    framebuffers: Names,
    programs: Names,
    /// (program, name) by location - 1.
    locations: Vec<(u32, String)>,
}

pub(crate) struct RecordingGl {
    state: RefCell<State>,
    pub texture_units: u32,
    pub max_texture_size: u32,
}

impl Default for RecordingGl {
    fn default() -> Self {
        Self {
            state: Default::default(),
            texture_units: 16,
            max_texture_size: 4096,
        }
    }
}

impl RecordingGl {
    /// A driver with `texture_units` combined texture units.
    pub fn with_texture_units(texture_units: u32) -> Self {
        Self {
            texture_units,
            ..Self::default()
        }
    }

    /// A driver that supports textures up to `max_texture_size` on a side.
    pub fn with_max_texture_size(max_texture_size: u32) -> Self {
        Self {
            max_texture_size,
            ..Self::default()
        }
    }

    /// Returns calls since the last take.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create(&self, names: impl FnOnce(&mut State) -> &mut Names, call: fn(u32) -> Call) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = names(&mut state).create();
        state.calls.push(call(name));
        name
    }

    fn delete(
        &self,
        names: impl FnOnce(&mut State) -> &mut Names,
        name: u32,
        call: fn(u32) -> Call,
    ) {
        let mut state = self.state.borrow_mut();
        names(&mut state).delete(name);
        state.calls.push(call(name));
    }
}

impl GlApi for RecordingGl {
    fn max_combined_texture_units(&self) -> u32 {
        self.texture_units
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn enable(&self, capability: Capability) {
        self.record(Call::Enable(capability));
    }

    fn disable(&self, capability: Capability) {
        self.record(Call::Disable(capability));
    }

    fn blend_func(&self, func: BlendFunc) {
        self.record(Call::BlendFunc(func));
    }

    fn blend_equation(&self, equation: BlendEquation) {
        self.record(Call::BlendEquation(equation));
    }

    fn depth_func(&self, func: DepthFunc) {
        self.record(Call::DepthFunc(func));
    }

    fn depth_mask(&self, write: bool) {
        self.record(Call::DepthMask(write));
    }

    fn polygon_mode(&self, mode: PolygonMode) {
        self.record(Call::PolygonMode(mode));
    }

    fn viewport(&self, viewport: IVec4) {
        self.record(Call::Viewport(viewport));
    }

    fn clear(&self, color: Vec4, depth: bool) {
        self.record(Call::Clear(color, depth));
    }

    fn create_buffer(&self) -> u32 {
        self.create(|s| &mut s.buffers, Call::CreateBuffer)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.delete(|s| &mut s.buffers, buffer, Call::DeleteBuffer);
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: u32) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(
        &self,
        target: BufferTarget,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) {
        if let Some(data) = data {
            assert_eq!(data.len(), size);
        }
        self.record(Call::BufferData(target, size, usage));
    }

    fn map_buffer(&self, target: BufferTarget, size: usize) -> Option<Vec<u8>> {
        self.record(Call::MapBuffer(target, size));
        Some(vec![0; size])
    }

    fn unmap_buffer(&self, target: BufferTarget) {
        self.record(Call::UnmapBuffer(target));
    }

    fn create_vertex_array(&self) -> u32 {
        self.create(|s| &mut s.vertex_arrays, Call::CreateVertexArray)
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let call = Call::DeleteVertexArray;
        self.delete(|s| &mut s.vertex_arrays, vertex_array, call);
    }

    fn bind_vertex_array(&self, vertex_array: u32) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn draw_arrays(&self, primitive: Primitive, first: u32, count: u32, instances: u32) {
        self.record(Call::DrawArrays(primitive, first, count, instances));
    }

    fn create_texture(&self) -> u32 {
        self.create(|s| &mut s.textures, Call::CreateTexture)
    }

    fn delete_texture(&self, texture: u32) {
        self.delete(|s| &mut s.textures, texture, Call::DeleteTexture);
    }

    fn active_texture(&self, unit: u32) {
        assert!(unit < self.texture_units);
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: TextureTarget, texture: u32) {
        self.record(Call::BindTexture(target, texture));
    }

    fn tex_image(&self, target: TextureTarget, format: &TextureFormat, data: Option<&[u8]>) {
        if let Some(data) = data {
            assert_eq!(data.len(), format.byte_size());
        }
        self.record(Call::TexImage(target, format.size, format.layers));
    }

    fn tex_parameter(&self, target: TextureTarget, parameter: TextureParameter, value: u32) {
        self.record(Call::TexParameter(target, parameter, value));
    }

    fn generate_mipmap(&self, target: TextureTarget) {
        self.record(Call::GenerateMipmap(target));
    }

    fn tex_buffer(&self, format: BufferTextureFormat, buffer: u32) {
        self.record(Call::TexBuffer(format, buffer));
    }

    fn get_tex_image(&self, target: TextureTarget, level: u32, format: PixelFormat) {
        self.record(Call::GetTexImage(target, level, format));
    }

    fn create_framebuffer(&self) -> u32 {
        self.create(|s| &mut s.framebuffers, Call::CreateFramebuffer)
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        let call = Call::DeleteFramebuffer;
        self.delete(|s| &mut s.framebuffers, framebuffer, call);
    }

    fn bind_framebuffer(&self, framebuffer: u32) {
        self.record(Call::BindFramebuffer(framebuffer));
    }

    fn framebuffer_texture(&self, attachment: Attachment, texture: u32, level: u32) {
        self.record(Call::FramebufferTexture(attachment, texture, level));
    }

    fn framebuffer_texture_layer(
        &self,
        attachment: Attachment,
        texture: u32,
        level: u32,
        layer: u32,
    ) {
        let call = Call::FramebufferTextureLayer(attachment, texture, level, layer);
        self.record(call);
    }

    fn create_program(&self, vertex: &str, fragment: &str) -> Result<u32, String> {
        if vertex.contains("syntax error") || fragment.contains("syntax error") {
            return Err(String::from("0:1: syntax error"));
        }
        Ok(self.create(|s| &mut s.programs, Call::CreateProgram))
    }

    fn delete_program(&self, program: u32) {
        self.delete(|s| &mut s.programs, program, Call::DeleteProgram);
    }

    fn use_program(&self, program: u32) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        if name.starts_with("unused") {
            return None;
        }
        let mut state = self.state.borrow_mut();
        let key = (program, name.to_owned());
        let index = match state.locations.iter().position(|l| *l == key) {
            Some(index) => index,
            None => {
                state.locations.push(key);
                state.locations.len() - 1
            }
        };
        Some(index as u32 + 1)
    }

    fn uniform(&self, location: u32, data: UniformData) {
        let upload = match data {
            UniformData::Float(v)
            | UniformData::Vec2(v)
            | UniformData::Vec3(v)
            | UniformData::Vec4(v)
            | UniformData::Mat4(v) => Upload::Float(v.to_vec()),
            UniformData::Int(v) | UniformData::IVec2(v) => Upload::Int(v.to_vec()),
        };
        self.record(Call::Uniform(location, upload));
    }
}
