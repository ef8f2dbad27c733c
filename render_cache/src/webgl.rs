// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! [`GlApi`] over
//! [WebGL2](https://rustwasm.github.io/wasm-bindgen/api/web_sys/struct.WebGl2RenderingContext.html).

use crate::buffer_texture::BufferTextureFormat;
use crate::configuration::{BlendEquation, BlendFunc, DepthFunc, PolygonMode};
use crate::gl::*;
use crate::texture::{PixelFormat, TextureFormat};
use glam::{IVec4, Vec4};
use log::{error, warn};
use std::cell::RefCell;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlFramebuffer, WebGlProgram,
    WebGlShader, WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

/// Name of context for get_context call.
const GL_NAME: &str = "webgl2";

/// Maps `u32` names to JS objects. Names start at 1 and freed names are reused, like a desktop
/// driver does.
struct Table<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, value: T) -> u32 {
        if let Some(name) = self.free.pop() {
            self.slots[name as usize - 1] = Some(value);
            name
        } else {
            self.slots.push(Some(value));
            self.slots.len() as u32
        }
    }

    fn get(&self, name: u32) -> Option<&T> {
        name.checked_sub(1)
            .and_then(|i| self.slots.get(i as usize))
            .and_then(Option::as_ref)
    }

    fn remove(&mut self, name: u32) -> Option<T> {
        let value = self.slots.get_mut(name.checked_sub(1)? as usize)?.take();
        if value.is_some() {
            self.free.push(name);
        }
        value
    }

    /// Removes every value `f` returns true for.
    fn remove_where(&mut self, f: impl Fn(&T) -> bool) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().map_or(false, &f) {
                *slot = None;
                self.free.push(i as u32 + 1);
            }
        }
    }
}

/// Gets a message out of a thrown JS value.
fn error_message(e: &JsValue) -> Option<String> {
    e.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| e.as_string())
}

/// A WebGL2 context. Things WebGL2 can't do (buffer textures, polygon mode, toggling sRGB
/// conversion, reading textures directly) are logged and ignored.
pub struct WebGl2 {
    gl: Gl,
    buffers: RefCell<Table<WebGlBuffer>>,
    vertex_arrays: RefCell<Table<WebGlVertexArrayObject>>,
    textures: RefCell<Table<WebGlTexture>>,
    framebuffers: RefCell<Table<WebGlFramebuffer>>,
    programs: RefCell<Table<WebGlProgram>>,
    /// Locations and the program they belong to.
    locations: RefCell<Table<(u32, WebGlUniformLocation)>>,
}

impl WebGl2 {
    /// Creates a context on `canvas`.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, String> {
        let gl = canvas
            .get_context(GL_NAME)
            .map_err(|e| {
                error_message(&e).unwrap_or_else(|| String::from("Error initializing WebGL2"))
            })?
            .ok_or("WebGL2 unsupported")?
            .dyn_into::<Gl>()
            .map_err(|_| String::from("context is not WebGL2"))?;
        Ok(Self::from_context(gl))
    }

    /// Wraps an existing context, which must be in its initial state.
    pub fn from_context(gl: Gl) -> Self {
        Self {
            gl,
            buffers: Default::default(),
            vertex_arrays: Default::default(),
            textures: Default::default(),
            framebuffers: Default::default(),
            programs: Default::default(),
            locations: Default::default(),
        }
    }

    /// The underlying context.
    pub fn context(&self) -> &Gl {
        &self.gl
    }

    fn parameter(&self, parameter: u32) -> u32 {
        self.gl
            .get_parameter(parameter)
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or_default() as u32
    }

    fn compile_shader(&self, kind: u32, source: &str) -> Result<WebGlShader, String> {
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or("unable to create shader object")?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        if self
            .gl
            .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            Ok(shader)
        } else {
            let log = self.gl.get_shader_info_log(&shader).unwrap_or_default();
            self.gl.delete_shader(Some(&shader));
            Err(log)
        }
    }
}

impl GlApi for WebGl2 {
    fn max_combined_texture_units(&self) -> u32 {
        self.parameter(Gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS)
    }

    fn max_texture_size(&self) -> u32 {
        self.parameter(Gl::MAX_TEXTURE_SIZE)
    }

    fn enable(&self, capability: Capability) {
        if capability == Capability::FramebufferSrgb {
            warn!("WebGL2 can't toggle sRGB conversion");
        } else {
            self.gl.enable(capability.to_gl());
        }
    }

    fn disable(&self, capability: Capability) {
        if capability == Capability::FramebufferSrgb {
            warn!("WebGL2 can't toggle sRGB conversion");
        } else {
            self.gl.disable(capability.to_gl());
        }
    }

    fn blend_func(&self, func: BlendFunc) {
        let [src_rgb, dst_rgb, src_alpha, dst_alpha] = func.factors();
        if func.is_separate() {
            self.gl
                .blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);
        } else {
            self.gl.blend_func(src_rgb, dst_rgb);
        }
    }

    fn blend_equation(&self, equation: BlendEquation) {
        self.gl.blend_equation(equation.to_gl());
    }

    fn depth_func(&self, func: DepthFunc) {
        self.gl.depth_func(func.to_gl());
    }

    fn depth_mask(&self, write: bool) {
        self.gl.depth_mask(write);
    }

    fn polygon_mode(&self, mode: PolygonMode) {
        if mode != PolygonMode::Fill {
            warn!("WebGL2 doesn't support polygon mode {:?}", mode);
        }
    }

    fn viewport(&self, viewport: IVec4) {
        self.gl.viewport(viewport.x, viewport.y, viewport.z, viewport.w);
    }

    fn clear(&self, color: Vec4, depth: bool) {
        self.gl.clear_color(color.x, color.y, color.z, color.w);
        let mut mask = Gl::COLOR_BUFFER_BIT;
        if depth {
            mask |= Gl::DEPTH_BUFFER_BIT;
        }
        self.gl.clear(mask);
    }

    fn create_buffer(&self) -> u32 {
        match self.gl.create_buffer() {
            Some(buffer) => self.buffers.borrow_mut().insert(buffer),
            None => {
                error!("failed to create buffer");
                0
            }
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        if let Some(buffer) = self.buffers.borrow_mut().remove(buffer) {
            self.gl.delete_buffer(Some(&buffer));
        }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: u32) {
        let buffers = self.buffers.borrow();
        self.gl.bind_buffer(target.to_gl(), buffers.get(buffer));
    }

    fn buffer_data(
        &self,
        target: BufferTarget,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) {
        match data {
            Some(data) => self
                .gl
                .buffer_data_with_u8_array(target.to_gl(), data, usage.to_gl()),
            None => self
                .gl
                .buffer_data_with_i32(target.to_gl(), size as i32, usage.to_gl()),
        }
    }

    fn map_buffer(&self, target: BufferTarget, size: usize) -> Option<Vec<u8>> {
        // WebGL2 has no mapping, read a copy instead.
        let mut bytes = vec![0; size];
        self.gl
            .get_buffer_sub_data_with_i32_and_u8_array(target.to_gl(), 0, &mut bytes);
        Some(bytes)
    }

    fn unmap_buffer(&self, _target: BufferTarget) {}

    fn create_vertex_array(&self) -> u32 {
        match self.gl.create_vertex_array() {
            Some(vertex_array) => self.vertex_arrays.borrow_mut().insert(vertex_array),
            None => {
                error!("failed to create vertex array");
                0
            }
        }
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        if let Some(vertex_array) = self.vertex_arrays.borrow_mut().remove(vertex_array) {
            self.gl.delete_vertex_array(Some(&vertex_array));
        }
    }

    fn bind_vertex_array(&self, vertex_array: u32) {
        let vertex_arrays = self.vertex_arrays.borrow();
        self.gl.bind_vertex_array(vertex_arrays.get(vertex_array));
    }

    fn draw_arrays(&self, primitive: Primitive, first: u32, count: u32, instances: u32) {
        if instances == 1 {
            self.gl
                .draw_arrays(primitive.to_gl(), first as i32, count as i32);
        } else {
            self.gl.draw_arrays_instanced(
                primitive.to_gl(),
                first as i32,
                count as i32,
                instances as i32,
            );
        }
    }

    fn create_texture(&self) -> u32 {
        match self.gl.create_texture() {
            Some(texture) => self.textures.borrow_mut().insert(texture),
            None => {
                error!("failed to create texture");
                0
            }
        }
    }

    fn delete_texture(&self, texture: u32) {
        if let Some(texture) = self.textures.borrow_mut().remove(texture) {
            self.gl.delete_texture(Some(&texture));
        }
    }

    fn active_texture(&self, unit: u32) {
        self.gl.active_texture(Gl::TEXTURE0 + unit);
    }

    fn bind_texture(&self, target: TextureTarget, texture: u32) {
        if target == TextureTarget::Buffer {
            warn!("WebGL2 doesn't support buffer textures");
            return;
        }
        let textures = self.textures.borrow();
        self.gl.bind_texture(target.to_gl(), textures.get(texture));
    }

    fn tex_image(&self, target: TextureTarget, format: &TextureFormat, data: Option<&[u8]>) {
        let pixel_format = format.pixel_format;
        if format.layers == 0 {
            if let Err(e) = self
                .gl
                .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                    target.to_gl(),
                    0,
                    pixel_format.internal_format() as i32,
                    format.size.x as i32,
                    format.size.y as i32,
                    0,
                    pixel_format.data_format(),
                    pixel_format.data_type(),
                    data,
                )
            {
                error!("tex_image_2d: {:?}", error_message(&e));
            }
        } else {
            self.gl.tex_storage_3d(
                target.to_gl(),
                format.mipmap_levels.max(1) as i32,
                pixel_format.internal_format(),
                format.size.x as i32,
                format.size.y as i32,
                format.layers as i32,
            );
        }
    }

    fn tex_parameter(&self, target: TextureTarget, parameter: TextureParameter, value: u32) {
        self.gl
            .tex_parameteri(target.to_gl(), parameter.to_gl(), value as i32);
    }

    fn generate_mipmap(&self, target: TextureTarget) {
        self.gl.generate_mipmap(target.to_gl());
    }

    fn tex_buffer(&self, format: BufferTextureFormat, _buffer: u32) {
        warn!("WebGL2 doesn't support buffer textures ({:?})", format);
    }

    fn get_tex_image(&self, target: TextureTarget, level: u32, format: PixelFormat) {
        warn!(
            "WebGL2 can't read back {:?} level {} as {:?}",
            target, level, format
        );
    }

    fn create_framebuffer(&self) -> u32 {
        match self.gl.create_framebuffer() {
            Some(framebuffer) => self.framebuffers.borrow_mut().insert(framebuffer),
            None => {
                error!("failed to create framebuffer");
                0
            }
        }
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        if let Some(framebuffer) = self.framebuffers.borrow_mut().remove(framebuffer) {
            self.gl.delete_framebuffer(Some(&framebuffer));
        }
    }

    fn bind_framebuffer(&self, framebuffer: u32) {
        let framebuffers = self.framebuffers.borrow();
        self.gl
            .bind_framebuffer(Gl::FRAMEBUFFER, framebuffers.get(framebuffer));
    }

    fn framebuffer_texture(&self, attachment: Attachment, texture: u32, level: u32) {
        let textures = self.textures.borrow();
        self.gl.framebuffer_texture_2d(
            Gl::FRAMEBUFFER,
            attachment.to_gl(),
            Gl::TEXTURE_2D,
            textures.get(texture),
            level as i32,
        );
    }

    fn framebuffer_texture_layer(
        &self,
        attachment: Attachment,
        texture: u32,
        level: u32,
        layer: u32,
    ) {
        let textures = self.textures.borrow();
        self.gl.framebuffer_texture_layer(
            Gl::FRAMEBUFFER,
            attachment.to_gl(),
            textures.get(texture),
            level as i32,
            layer as i32,
        );
    }

    fn create_program(&self, vertex: &str, fragment: &str) -> Result<u32, String> {
        let vertex = self
            .compile_shader(Gl::VERTEX_SHADER, vertex)
            .map_err(|e| format!("vs: {}", e))?;
        let fragment = match self.compile_shader(Gl::FRAGMENT_SHADER, fragment) {
            Ok(fragment) => fragment,
            Err(e) => {
                self.gl.delete_shader(Some(&vertex));
                return Err(format!("fs: {}", e));
            }
        };

        let program = self
            .gl
            .create_program()
            .ok_or("unable to create program object")?;
        self.gl.attach_shader(&program, &vertex);
        self.gl.attach_shader(&program, &fragment);
        self.gl.link_program(&program);

        // Shaders aren't needed after linking.
        self.gl.detach_shader(&program, &vertex);
        self.gl.detach_shader(&program, &fragment);
        self.gl.delete_shader(Some(&vertex));
        self.gl.delete_shader(Some(&fragment));

        if self
            .gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            Ok(self.programs.borrow_mut().insert(program))
        } else {
            let log = self.gl.get_program_info_log(&program).unwrap_or_default();
            self.gl.delete_program(Some(&program));
            Err(log)
        }
    }

    fn delete_program(&self, program: u32) {
        if let Some(removed) = self.programs.borrow_mut().remove(program) {
            self.locations
                .borrow_mut()
                .remove_where(|(owner, _)| *owner == program);
            self.gl.delete_program(Some(&removed));
        }
    }

    fn use_program(&self, program: u32) {
        let programs = self.programs.borrow();
        self.gl.use_program(programs.get(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let location = {
            let programs = self.programs.borrow();
            self.gl.get_uniform_location(programs.get(program)?, name)?
        };
        Some(self.locations.borrow_mut().insert((program, location)))
    }

    fn uniform(&self, location: u32, data: UniformData) {
        let locations = self.locations.borrow();
        let location = locations.get(location).map(|(_, l)| l);
        match data {
            UniformData::Float(v) => self.gl.uniform1fv_with_f32_array(location, v),
            UniformData::Vec2(v) => self.gl.uniform2fv_with_f32_array(location, v),
            UniformData::Vec3(v) => self.gl.uniform3fv_with_f32_array(location, v),
            UniformData::Vec4(v) => self.gl.uniform4fv_with_f32_array(location, v),
            UniformData::Mat4(v) => self
                .gl
                .uniform_matrix4fv_with_f32_array(location, false, v),
            UniformData::Int(v) => self.gl.uniform1iv_with_i32_array(location, v),
            UniformData::IVec2(v) => self.gl.uniform2iv_with_i32_array(location, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_reuses_names() {
        let mut table = Table::default();
        assert_eq!(table.insert("a"), 1);
        assert_eq!(table.insert("b"), 2);
        assert_eq!(table.remove(1), Some("a"));
        assert_eq!(table.remove(1), None);
        assert_eq!(table.get(1), None);
        assert_eq!(table.get(0), None);
        assert_eq!(table.insert("c"), 1);
        assert_eq!(table.get(1), Some(&"c"));

        table.remove_where(|v| *v == "b");
        assert_eq!(table.get(2), None);
        assert_eq!(table.insert("d"), 2);
    }
}
