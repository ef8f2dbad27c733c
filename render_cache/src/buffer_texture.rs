// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::buffer::Buffer;
use crate::context::Context;
use crate::gl::consts::*;
use crate::gl::*;
use crate::qualifier::Qualified;
use crate::texture::SampledTexture;
use log::error;
use std::rc::Rc;

/// How a shader sees the elements of a [`BufferTexture`]'s buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum BufferTextureFormat {
    R32F,
    Rgba32F,
    Rgb32F,
    Rgb32UI,
    Rgb32I,
}

impl BufferTextureFormat {
    /// Get the underlying internal format.
    pub const fn internal_format(self) -> u32 {
        match self {
            Self::R32F => R32F,
            Self::Rgba32F => RGBA32F,
            Self::Rgb32F => RGB32F,
            Self::Rgb32UI => RGB32UI,
            Self::Rgb32I => RGB32I,
        }
    }

    /// Size of one element in bytes.
    pub const fn element_size(self) -> usize {
        match self {
            Self::R32F => 4,
            Self::Rgba32F => 16,
            Self::Rgb32F | Self::Rgb32UI | Self::Rgb32I => 12,
        }
    }
}

/// Exposes a [`Buffer`] to shaders as a 1d texture (`samplerBuffer`).
pub struct BufferTexture<G: GlApi> {
    context: Rc<Context<G>>,
    handle: Qualified,
    format: BufferTextureFormat,
    attached: Qualified,
}

impl<G: GlApi> BufferTexture<G> {
    /// Creates a buffer texture with nothing attached.
    pub fn new(context: &Rc<Context<G>>, format: BufferTextureFormat) -> Self {
        let raw = context.gl().create_texture();
        Self {
            context: Rc::clone(context),
            handle: Qualified::new(raw, context.next_qualifier()),
            format,
            attached: Qualified::NONE,
        }
    }

    /// Binds it to the active texture unit.
    pub fn bind(&self) {
        let unit = self.context.active_unit();
        self.context
            .bind_texture(self.handle, TextureTarget::Buffer, unit);
    }

    /// Uses `buffer` as storage. Does nothing if it's already attached. Logs an error and does
    /// nothing if the buffer's elements aren't the size of the format's.
    pub fn attach(&mut self, buffer: &Buffer<G>) {
        if self.attached == buffer.handle() {
            return;
        }

        if buffer.element_size() != self.format.element_size() {
            error!(
                "mismatched element size when attaching buffer to buffer texture, wanted {}, have {}",
                self.format.element_size(),
                buffer.element_size()
            );
            return;
        }

        self.bind();
        let gl = self.context.gl();
        gl.tex_buffer(self.format, buffer.handle().raw);
        self.attached = buffer.handle();
    }

    /// The attached buffer, if any.
    pub fn attached(&self) -> Qualified {
        self.attached
    }

    /// The format it was created with.
    pub fn format(&self) -> BufferTextureFormat {
        self.format
    }
}

impl<G: GlApi> SampledTexture for BufferTexture<G> {
    const TARGET: TextureTarget = TextureTarget::Buffer;

    fn handle(&self) -> Qualified {
        self.handle
    }
}

impl<G: GlApi> Drop for BufferTexture<G> {
    fn drop(&mut self) {
        self.context.gl().delete_texture(self.handle.raw);
    }
}
