// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::Context;
use crate::gl::*;
use crate::qualifier::Qualified;
use crate::registry::ProgramDescription;
use linear_map::LinearMap;
use log::{error, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A linked vertex + fragment shader pair.
pub struct Program<G: GlApi> {
    context: Rc<Context<G>>,
    handle: Qualified,
    vertex: Rc<str>,
    fragment: Rc<str>,
    next_sampler: Cell<u32>,
    // Use a LinearMap because there are relatively few uniforms.
    uniform_cache: RefCell<LinearMap<String, Option<u32>>>,
}

impl<G: GlApi> Program<G> {
    /// Compiles and links glsl sources. Their `#version` is replaced with the context's. Returns
    /// `None` (after logging the driver's errors) if either fails.
    pub fn load(context: &Rc<Context<G>>, vertex: &str, fragment: &str) -> Option<Self> {
        Self::load_sources(context, vertex.into(), fragment.into())
    }

    fn load_sources(context: &Rc<Context<G>>, vertex: Rc<str>, fragment: Rc<str>) -> Option<Self> {
        info!("compiling shaders");
        let raw = match context.gl().create_program(
            &context.prepare_shader_source(&vertex),
            &context.prepare_shader_source(&fragment),
        ) {
            Ok(raw) => raw,
            Err(e) => {
                error!("program error: {}", e);
                return None;
            }
        };
        info!("program id: {}", raw);

        let handle = Qualified::new(raw, context.next_qualifier());
        context.programs_mut().register(
            raw,
            ProgramDescription {
                qualifier: handle.qualifier,
                auto_reload: false,
                vertex: Rc::clone(&vertex),
                fragment: Rc::clone(&fragment),
            },
        );

        Some(Self {
            context: Rc::clone(context),
            handle,
            vertex,
            fragment,
            next_sampler: Cell::new(0),
            uniform_cache: Default::default(),
        })
    }

    /// Compiles the same sources again, as a new program. Uniforms are moved over with
    /// [`Uniform::initialize`][`crate::Uniform::initialize`].
    pub fn reload(&self) -> Option<Self> {
        let reloaded = Self::load_sources(
            &self.context,
            Rc::clone(&self.vertex),
            Rc::clone(&self.fragment),
        )?;
        if self.auto_reload() {
            reloaded.set_auto_reload(true);
        }
        Some(reloaded)
    }

    /// Makes it the current program (if it isn't already).
    pub fn use_program(&self) {
        self.context.use_program(self.handle);
    }

    /// Reserves the next texture unit for a sampler.
    pub fn next_sampler(&self) -> u32 {
        let unit = self.next_sampler.get();
        assert!(
            unit < self.context.texture_units(),
            "ran out of texture units"
        );
        self.next_sampler.set(unit + 1);
        unit
    }

    /// Flags the program for automatic reloading (see
    /// [`ProgramRegistry::auto_reload`][`crate::ProgramRegistry::auto_reload`]).
    pub fn set_auto_reload(&self, auto_reload: bool) {
        self.context
            .programs_mut()
            .set_auto_reload(self.handle.raw, auto_reload);
    }

    /// Returns true if flagged for automatic reloading.
    pub fn auto_reload(&self) -> bool {
        self.context
            .programs()
            .lookup(self.handle.raw)
            .map_or(false, |d| d.auto_reload)
    }

    /// Gets the (cached) location of a named uniform.
    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        if let Some(&location) = self.uniform_cache.borrow().get(name) {
            return location;
        }
        let location = self.context.gl().uniform_location(self.handle.raw, name);
        if location.is_none() && cfg!(debug_assertions) {
            warn!("uniform {} does not exist or is not in use", name);
        }
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_owned(), location);
        location
    }

    /// The qualified driver name.
    pub fn handle(&self) -> Qualified {
        self.handle
    }

    /// Vertex source as passed to [`load`][`Self::load`].
    pub fn vertex_source(&self) -> &str {
        &self.vertex
    }

    /// Fragment source as passed to [`load`][`Self::load`].
    pub fn fragment_source(&self) -> &str {
        &self.fragment
    }

    pub(crate) fn context(&self) -> &Rc<Context<G>> {
        &self.context
    }
}

impl<G: GlApi> Drop for Program<G> {
    fn drop(&mut self) {
        self.context
            .programs_mut()
            .unregister(self.handle.raw, self.handle.qualifier);
        self.context.gl().delete_program(self.handle.raw);
    }
}
