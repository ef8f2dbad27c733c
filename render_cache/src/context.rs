// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::configuration::*;
use crate::gl::*;
use crate::qualifier::{Qualified, Qualifier, QualifierCounter};
use crate::registry::ProgramRegistry;
use crate::tally::{Tallies, Tally};
use glam::IVec4;
use log::{debug, error};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

/// The GLSL dialect shaders are compiled as. Sources have their own `#version` line (and
/// default precision) replaced with the context's.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShaderVersion {
    /// Desktop OpenGL 3.3.
    Glsl330,
    /// OpenGL ES 3.2.
    Glsl320Es,
    /// OpenGL ES 3.0 (WebGL2).
    Glsl300Es,
}

impl ShaderVersion {
    /// The text prepended to every shader source.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Glsl330 => "#version 330\n",
            Self::Glsl320Es => "#version 320 es\nprecision mediump float;\n",
            Self::Glsl300Es => "#version 300 es\nprecision mediump float;\n",
        }
    }
}

/// Strips a leading `#version` line and a default `precision` statement right after it.
pub fn trim_shader_prefix(source: &str) -> &str {
    let mut rest = source.trim_start();
    if rest.starts_with("#version") {
        rest = rest.split_once('\n').map_or("", |(_, after)| after);
    }
    let trimmed = rest.trim_start();
    if trimmed.starts_with("precision") {
        if let Some((_, after)) = trimmed.split_once(';') {
            rest = after;
        }
    }
    rest
}

/// What one texture unit holds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct SamplerUnit {
    texture: Qualified,
    target: Option<TextureTarget>,
}

/// What the context believes is bound in the driver.
#[derive(Debug, Default)]
struct Bindings {
    vertex_array: Qualified,
    program: Qualified,
    framebuffer: Qualified,
    buffers: [Qualified; BufferTarget::COUNT],
    sampler_units: Vec<SamplerUnit>,
    /// `None` while the driver's active unit is unknown.
    active_unit: Option<u32>,
    viewport: Option<IVec4>,
}

impl Bindings {
    /// Makes `unit` the active texture unit if it isn't already.
    fn activate<G: GlApi>(&mut self, gl: &G, unit: u32) {
        // Don't do redundant calls.
        if self.active_unit != Some(unit) {
            self.active_unit = Some(unit);
            gl.active_texture(unit);
        }
    }
}

/// Wraps a [`GlApi`] driver and filters out state changes that wouldn't change anything. Every
/// bind/use/set call compares the requested state against what was last sent and only reaches
/// the driver on a mismatch. Resources are identified by [`Qualified`] handles so a deleted and
/// recreated resource that reuses a raw name is never mistaken for the old one.
///
/// Single threaded: it's shared between resources as an [`Rc`] and mutated through [`Cell`]s.
pub struct Context<G> {
    gl: G,
    qualifiers: QualifierCounter,
    bindings: RefCell<Bindings>,
    configuration: Cell<ConfigurationCache>,
    tallies: Cell<Tallies>,
    programs: RefCell<ProgramRegistry>,
    shader_version: ShaderVersion,
}

impl<G: GlApi> Context<G> {
    /// Wraps `gl`, which must be in its initial state (nothing bound, unit 0 active).
    pub fn new(gl: G, shader_version: ShaderVersion) -> Rc<Self> {
        let units = gl.max_combined_texture_units() as usize;
        if units == 0 {
            error!("driver reported no texture units, textures can't be bound");
        }
        debug!("{} texture units, {:?}", units, shader_version);

        Rc::new(Self {
            gl,
            qualifiers: QualifierCounter::new(),
            bindings: RefCell::new(Bindings {
                sampler_units: vec![SamplerUnit::default(); units],
                active_unit: Some(0),
                ..Default::default()
            }),
            configuration: Default::default(),
            tallies: Default::default(),
            programs: Default::default(),
            shader_version,
        })
    }

    /// The underlying driver. Calls made directly on it bypass the cache, so follow them with
    /// [`reset`][`Self::reset`].
    pub fn gl(&self) -> &G {
        &self.gl
    }

    /// Mints a qualifier for a new resource.
    pub fn next_qualifier(&self) -> Qualifier {
        self.qualifiers.next()
    }

    /// Binds a vertex array if it isn't already bound.
    pub fn bind_vertex_array(&self, vertex_array: Qualified) {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.vertex_array != vertex_array {
            self.tally(|t| t.vertex_array_switches += 1);
            self.gl.bind_vertex_array(vertex_array.raw);
            bindings.vertex_array = vertex_array;
        }
    }

    /// Binds a buffer to `target` if it isn't already bound there.
    pub fn bind_buffer(&self, target: BufferTarget, buffer: Qualified) {
        let mut bindings = self.bindings.borrow_mut();
        let bound = &mut bindings.buffers[target.index()];
        if *bound != buffer {
            self.gl.bind_buffer(target, buffer.raw);
            *bound = buffer;
        }
    }

    /// Unbinds whatever is bound to `target`, if anything.
    pub fn unbind_buffer(&self, target: BufferTarget) {
        let mut bindings = self.bindings.borrow_mut();
        let bound = &mut bindings.buffers[target.index()];
        if bound.is_some() {
            self.gl.bind_buffer(target, 0);
            bound.clear();
        }
    }

    /// Makes a program current if it isn't already.
    pub fn use_program(&self, program: Qualified) {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.program != program {
            self.tally(|t| t.program_switches += 1);
            self.gl.use_program(program.raw);
            bindings.program = program;
        }
    }

    /// Binds a framebuffer if it isn't already bound.
    pub fn bind_framebuffer(&self, framebuffer: Qualified) {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.framebuffer != framebuffer {
            self.gl.bind_framebuffer(framebuffer.raw);
            bindings.framebuffer = framebuffer;
        }
    }

    /// Makes `unit` the active texture unit if it isn't already.
    pub fn set_active_unit(&self, unit: u32) {
        self.bindings.borrow_mut().activate(&self.gl, unit);
    }

    /// Binds `texture` as `target` to texture `unit`. A unit only holds one target at a time, so
    /// if the unit currently holds a different target, that is unbound first.
    pub fn bind_texture(&self, texture: Qualified, target: TextureTarget, unit: u32) {
        let mut bindings = self.bindings.borrow_mut();
        let index = unit as usize;
        assert!(
            index < bindings.sampler_units.len(),
            "texture unit {} out of range",
            unit
        );

        let current = bindings.sampler_units[index];
        if let Some(bound_target) = current.target.filter(|&t| t != target) {
            bindings.activate(&self.gl, unit);
            self.gl.bind_texture(bound_target, 0);
            bindings.sampler_units[index].texture.clear();
        }

        if bindings.sampler_units[index].texture != texture {
            bindings.activate(&self.gl, unit);
            self.gl.bind_texture(target, texture.raw);
        }

        bindings.sampler_units[index] = SamplerUnit {
            texture,
            target: Some(target),
        };
    }

    /// Sets the viewport `(x, y, width, height)` if it differs.
    pub fn set_viewport(&self, viewport: IVec4) {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.viewport != Some(viewport) {
            bindings.viewport = Some(viewport);
            self.gl.viewport(viewport);
        }
    }

    /// Applies every axis of `configuration` that differs from the cached one. Axes are
    /// independent, so changing one never resends the others.
    pub fn set_configuration(&self, configuration: &Configuration) {
        self.set_blend(configuration.blend);
        self.set_blend_func(configuration.blend_func);
        self.set_blend_equation(configuration.blend_equation);
        self.set_depth_test(configuration.depth_test);
        self.set_depth_func(configuration.depth_func);
        self.set_depth_mask(configuration.depth_mask);
        self.set_polygon_mode(configuration.polygon_mode);
        self.set_srgb_mode(configuration.srgb_mode);
    }

    /// Enables or disables blending if it differs.
    pub fn set_blend(&self, blend: Blend) {
        if self.configure(|c| update_axis(&mut c.blend, blend)) {
            match blend {
                Blend::Enabled => self.gl.enable(Capability::Blend),
                Blend::Disabled => self.gl.disable(Capability::Blend),
            }
        }
    }

    /// Sets the blend factors if they differ.
    pub fn set_blend_func(&self, func: BlendFunc) {
        if self.configure(|c| update_axis(&mut c.blend_func, func)) {
            self.gl.blend_func(func);
        }
    }

    /// Sets the blend equation if it differs.
    pub fn set_blend_equation(&self, equation: BlendEquation) {
        if self.configure(|c| update_axis(&mut c.blend_equation, equation)) {
            self.gl.blend_equation(equation);
        }
    }

    /// Enables or disables the depth test if it differs.
    pub fn set_depth_test(&self, depth_test: DepthTest) {
        if self.configure(|c| update_axis(&mut c.depth_test, depth_test)) {
            match depth_test {
                DepthTest::Enabled => self.gl.enable(Capability::DepthTest),
                DepthTest::Disabled => self.gl.disable(Capability::DepthTest),
            }
        }
    }

    /// Sets the depth comparison if it differs.
    pub fn set_depth_func(&self, func: DepthFunc) {
        if self.configure(|c| update_axis(&mut c.depth_func, func)) {
            self.gl.depth_func(func);
        }
    }

    /// Sets whether depth is written if it differs.
    pub fn set_depth_mask(&self, mask: DepthMask) {
        if self.configure(|c| update_axis(&mut c.depth_mask, mask)) {
            self.gl.depth_mask(mask == DepthMask::Write);
        }
    }

    /// Sets the polygon rasterization mode if it differs.
    pub fn set_polygon_mode(&self, mode: PolygonMode) {
        if self.configure(|c| update_axis(&mut c.polygon_mode, mode)) {
            self.gl.polygon_mode(mode);
        }
    }

    /// Enables or disables sRGB conversion if it differs.
    pub fn set_srgb_mode(&self, mode: SrgbMode) {
        if self.configure(|c| update_axis(&mut c.srgb_mode, mode)) {
            match mode {
                SrgbMode::On => self.gl.enable(Capability::FramebufferSrgb),
                SrgbMode::Off => self.gl.disable(Capability::FramebufferSrgb),
            }
        }
    }

    /// Call after something else (e.g. a GUI library) used the driver behind the context's back.
    /// Unbinds what the context believes is bound and forgets all cached state, so every
    /// subsequent request reaches the driver.
    pub fn reset(&self) {
        let mut bindings = self.bindings.borrow_mut();
        let bindings = &mut *bindings;

        // Something else may have changed the active unit.
        bindings.active_unit = None;

        for target in [BufferTarget::PixelPack, BufferTarget::PixelUnpack] {
            if bindings.buffers[target.index()].is_some() {
                self.gl.bind_buffer(target, 0);
            }
        }
        bindings.buffers = Default::default();
        bindings.vertex_array.clear();
        bindings.program.clear();
        bindings.framebuffer.clear();

        for unit in 0..bindings.sampler_units.len() {
            let slot = std::mem::take(&mut bindings.sampler_units[unit]);
            if let Some(target) = slot.target.filter(|_| slot.texture.is_some()) {
                bindings.activate(&self.gl, unit as u32);
                self.gl.bind_texture(target, 0);
            }
        }

        // Always explicit, even if an unbind just left unit 0 active.
        bindings.active_unit = None;
        bindings.activate(&self.gl, 0);

        bindings.viewport = None;
        self.configuration.set(Default::default());
    }

    /// Draws `count` vertices of `vertex_array` starting at `first`.
    pub fn draw_arrays(
        &self,
        vertex_array: Qualified,
        primitive: Primitive,
        first: u32,
        count: u32,
    ) {
        self.draw_arrays_instanced(vertex_array, primitive, first, count, 1);
    }

    /// Like [`draw_arrays`][`Self::draw_arrays`] but draws `instances` instances.
    pub fn draw_arrays_instanced(
        &self,
        vertex_array: Qualified,
        primitive: Primitive,
        first: u32,
        count: u32,
        instances: u32,
    ) {
        self.bind_vertex_array(vertex_array);
        self.tally(|t| t.draw_calls += 1);
        self.gl.draw_arrays(primitive, first, count, instances);
    }

    /// Ends a frame: the current [`Tally`] becomes [`last_frame`][`Self::last_frame`].
    pub fn cycle(&self) {
        let mut tallies = self.tallies.get();
        tallies.cycle();
        self.tallies.set(tallies);
    }

    /// Work done since the last [`cycle`][`Self::cycle`].
    pub fn this_frame(&self) -> Tally {
        self.tallies.get().this_frame
    }

    /// Work done between the last two [`cycle`][`Self::cycle`]s.
    pub fn last_frame(&self) -> Tally {
        self.tallies.get().last_frame
    }

    pub(crate) fn tally_buffer_bytes(&self, bytes: usize) {
        self.tally(|t| {
            t.buffer_data_calls += 1;
            t.buffer_bytes += bytes;
        });
    }

    pub(crate) fn tally_uniform_bytes(&self, bytes: usize) {
        self.tally(|t| {
            t.set_uniform_calls += 1;
            t.uniform_bytes += bytes;
        });
    }

    /// The GLSL dialect of this context.
    pub fn shader_version(&self) -> ShaderVersion {
        self.shader_version
    }

    /// Replaces the `#version` (and default precision) of `source` with this context's.
    pub fn prepare_shader_source(&self, source: &str) -> String {
        let mut prepared = String::from(self.shader_version.prefix());
        prepared += trim_shader_prefix(source);
        prepared
    }

    /// Live programs.
    pub fn programs(&self) -> Ref<'_, ProgramRegistry> {
        self.programs.borrow()
    }

    pub(crate) fn programs_mut(&self) -> RefMut<'_, ProgramRegistry> {
        self.programs.borrow_mut()
    }

    /// The currently bound vertex array.
    pub fn bound_vertex_array(&self) -> Qualified {
        self.bindings.borrow().vertex_array
    }

    /// The current program.
    pub fn bound_program(&self) -> Qualified {
        self.bindings.borrow().program
    }

    /// The currently bound framebuffer.
    pub fn bound_framebuffer(&self) -> Qualified {
        self.bindings.borrow().framebuffer
    }

    /// The buffer bound to `target`.
    pub fn bound_buffer(&self, target: BufferTarget) -> Qualified {
        self.bindings.borrow().buffers[target.index()]
    }

    /// The texture bound to `unit` and what it's bound as. Nothing is bound to units the driver
    /// doesn't have.
    pub fn bound_texture(&self, unit: u32) -> (Qualified, Option<TextureTarget>) {
        let unit = self
            .bindings
            .borrow()
            .sampler_units
            .get(unit as usize)
            .copied()
            .unwrap_or_default();
        (unit.texture, unit.target)
    }

    /// The active texture unit.
    pub fn active_unit(&self) -> u32 {
        // Only unknown in the middle of a reset.
        self.bindings.borrow().active_unit.unwrap_or_default()
    }

    /// Number of texture units.
    pub fn texture_units(&self) -> u32 {
        self.bindings.borrow().sampler_units.len() as u32
    }

    fn tally(&self, f: impl FnOnce(&mut Tally)) {
        let mut tallies = self.tallies.get();
        f(&mut tallies.this_frame);
        self.tallies.set(tallies);
    }

    fn configure(&self, f: impl FnOnce(&mut ConfigurationCache) -> bool) -> bool {
        let mut cache = self.configuration.get();
        let changed = f(&mut cache);
        self.configuration.set(cache);
        changed
    }
}
