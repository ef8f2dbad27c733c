// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::Context;
use crate::gl::*;
use crate::qualifier::{Qualified, Qualifier};
use crate::texture::{SampledTexture, Texture2d, Texture2dArray};
use glam::Vec4;
use std::rc::Rc;

/// Something to render into: either textures attached to it, or the screen.
pub struct Framebuffer<G: GlApi> {
    context: Rc<Context<G>>,
    handle: Qualified,
}

impl<G: GlApi> Framebuffer<G> {
    /// Creates a framebuffer with nothing attached.
    pub fn new(context: &Rc<Context<G>>) -> Self {
        let raw = context.gl().create_framebuffer();
        Self {
            handle: Qualified::new(raw, context.next_qualifier()),
            context: Rc::clone(context),
        }
    }

    /// The default framebuffer. It's never deleted.
    pub fn screen_target(context: &Rc<Context<G>>) -> Self {
        Self {
            handle: Qualified::new(0, Qualifier::SCREEN),
            context: Rc::clone(context),
        }
    }

    /// Returns true if this is the [`screen_target`][`Self::screen_target`].
    pub fn is_screen(&self) -> bool {
        self.handle.qualifier == Qualifier::SCREEN
    }

    /// Binds it (if it isn't already).
    pub fn bind(&self) {
        self.context.bind_framebuffer(self.handle);
    }

    /// Renders `level` of `texture` at `attachment`.
    pub fn attach(&self, attachment: Attachment, texture: &Texture2d<G>, level: u32) {
        self.bind();
        self.context
            .gl()
            .framebuffer_texture(attachment, texture.handle().raw, level);
    }

    /// Renders `level` of `layer` of `texture` at `attachment`.
    pub fn attach_layer(
        &self,
        attachment: Attachment,
        texture: &Texture2dArray<G>,
        layer: u32,
        level: u32,
    ) {
        assert!(layer < texture.layers(), "layer {} out of range", layer);
        self.bind();
        self.context
            .gl()
            .framebuffer_texture_layer(attachment, texture.handle().raw, level, layer);
    }

    /// Fills with `color` and, if `depth`, resets depth.
    pub fn clear(&self, color: Vec4, depth: bool) {
        self.bind();
        self.context.gl().clear(color, depth);
    }

    /// The qualified driver name.
    pub fn handle(&self) -> Qualified {
        self.handle
    }
}

impl<G: GlApi> Drop for Framebuffer<G> {
    fn drop(&mut self) {
        if !self.is_screen() {
            self.context.gl().delete_framebuffer(self.handle.raw);
        }
    }
}
