// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

#![warn(missing_docs)]
#![crate_name = "render_cache"]

//! # Render Cache
//!
//! [`render_cache`][`crate`] wraps an OpenGL (ES) style driver ([`GlApi`]) and skips every
//! bind, use and state change that wouldn't change anything. Resources ([`Buffer`],
//! [`Texture2d`], [`Program`], ...) are identified by [`Qualified`] handles, so a resource that
//! reuses the raw name of a deleted one is never mistaken for it.
//!
//! With the `webgl` feature (on by default) [`WebGl2`] implements [`GlApi`] over
//! [WebGL2](https://rustwasm.github.io/wasm-bindgen/api/web_sys/struct.WebGl2RenderingContext.html).

pub mod gl;
#[cfg(feature = "webgl")]
mod webgl;

mod angle;
mod buffer;
mod buffer_texture;
mod cached;
mod configuration;
mod context;
mod framebuffer;
mod managed_texture;
mod pixel_buffer;
mod program;
mod qualifier;
mod registry;
mod tally;
mod texture;
mod uniform;
mod vertex_array;

#[cfg(test)]
mod testing;

#[cfg(feature = "webgl")]
pub use webgl::*;

// Re-export to provide a simpler api.
pub use angle::*;
pub use buffer::*;
pub use buffer_texture::*;
pub use cached::*;
pub use configuration::*;
pub use context::*;
pub use framebuffer::*;
pub use gl::{
    Attachment, BufferTarget, BufferUsage, Capability, GlApi, Primitive, TextureParameter,
    TextureTarget, UniformData,
};
pub use managed_texture::*;
pub use pixel_buffer::*;
pub use program::*;
pub use qualifier::*;
pub use registry::*;
pub use tally::*;
pub use texture::*;
pub use uniform::*;
pub use vertex_array::*;
