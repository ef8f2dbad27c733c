// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::buffer::Buffer;
use crate::context::Context;
use crate::gl::*;
use crate::texture::{PixelFormat, Texture2d};
use bytemuck::{Pod, Zeroable};
use glam::UVec2;
use log::error;
use std::ops::Deref;
use std::rc::Rc;

/// Reads textures back from the driver.
pub struct PixelBuffer<G: GlApi> {
    buffer: Buffer<G>,
    download_size: Option<usize>,
    mapped: bool,
}

impl<G: GlApi> PixelBuffer<G> {
    /// Creates an empty pixel buffer.
    pub fn new(context: &Rc<Context<G>>) -> Self {
        Self {
            buffer: Buffer::new(context),
            download_size: None,
            mapped: false,
        }
    }

    /// Starts copying mipmap `level` of `texture`, converted to `pixel_format`, into the buffer.
    /// Call [`map`][`Self::map`] to get the pixels.
    pub fn download(&mut self, texture: &Texture2d<G>, level: u32, pixel_format: PixelFormat) {
        assert!(!self.mapped, "download while mapped");

        let mut format = *texture.format();
        format.pixel_format = pixel_format;
        let size = format.size;
        format.size = UVec2::new((size.x >> level).max(1), (size.y >> level).max(1));
        let size = format.byte_size();

        self.buffer
            .allocate(1, size, BufferUsage::StaticRead, BufferTarget::PixelPack);
        texture.bind();
        self.buffer
            .context()
            .gl()
            .get_tex_image(TextureTarget::Texture2d, level, pixel_format);
        self.download_size = Some(size);
    }

    /// Maps the last download. Returns `None` (after logging an error) if the driver fails to
    /// map it. The buffer stays mapped until the returned guard is dropped.
    pub fn map<T: Pod>(&mut self) -> Option<MappedRead<'_, G, T>> {
        assert!(!self.mapped, "already mapped");
        let size = match self.download_size.take() {
            Some(size) => size,
            None => panic!("mapped without a pending download"),
        };

        self.buffer.bind(BufferTarget::PixelPack);
        let gl = self.buffer.context().gl();
        let bytes = match gl.map_buffer(BufferTarget::PixelPack, size) {
            Some(bytes) => bytes,
            None => {
                error!("failed to map pixel buffer of {} bytes", size);
                return None;
            }
        };
        self.mapped = true;

        let mut data = vec![<T as Zeroable>::zeroed(); bytes.len() / std::mem::size_of::<T>()];
        let len = std::mem::size_of_val(data.as_slice());
        let out: &mut [u8] = bytemuck::cast_slice_mut(&mut data);
        out.copy_from_slice(&bytes[..len]);

        Some(MappedRead {
            pixel_buffer: self,
            data,
        })
    }

    /// Returns true if a [`MappedRead`] is alive (or was leaked).
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }
}

impl<G: GlApi> Drop for PixelBuffer<G> {
    fn drop(&mut self) {
        if self.mapped {
            panic!("pixel buffer dropped while mapped");
        }
    }
}

/// Pixels of a [`PixelBuffer`], unmapped on drop.
pub struct MappedRead<'a, G: GlApi, T> {
    pixel_buffer: &'a mut PixelBuffer<G>,
    data: Vec<T>,
}

impl<G: GlApi, T> Deref for MappedRead<'_, G, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<G: GlApi, T> Drop for MappedRead<'_, G, T> {
    fn drop(&mut self) {
        let buffer = &self.pixel_buffer.buffer;
        buffer.bind(BufferTarget::PixelPack);
        buffer.context().gl().unmap_buffer(BufferTarget::PixelPack);
        self.pixel_buffer.mapped = false;
    }
}
