// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::Context;
use crate::gl::consts::*;
use crate::gl::*;
use crate::qualifier::Qualified;
use glam::UVec2;
use log::error;
use std::rc::Rc;

/// Layout of one pixel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// 1 channel, 8 bits.
    R8,
    /// 1 channel, half float.
    R16F,
    /// 1 channel, 16 bits.
    R16,
    /// 3 channels, 16 bits each.
    Rgb16,
    /// 4 channels, 8 bits each.
    Rgba8,
}

impl PixelFormat {
    /// Get the underlying internal format.
    pub const fn internal_format(self) -> u32 {
        match self {
            Self::R8 => R8,
            Self::R16F => R16F,
            Self::R16 => R16,
            Self::Rgb16 => RGB16,
            Self::Rgba8 => RGBA8,
        }
    }

    /// Get the underlying src format.
    pub const fn data_format(self) -> u32 {
        match self {
            Self::R8 | Self::R16F | Self::R16 => RED,
            Self::Rgb16 => RGB,
            Self::Rgba8 => RGBA,
        }
    }

    /// Get the underlying src type.
    pub const fn data_type(self) -> u32 {
        match self {
            Self::R8 | Self::Rgba8 => UNSIGNED_BYTE,
            Self::R16F => HALF_FLOAT,
            Self::R16 | Self::Rgb16 => UNSIGNED_SHORT,
        }
    }

    /// Size of one pixel in bytes.
    pub const fn pixel_size(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::R16F | Self::R16 => 2,
            Self::Rgb16 => 6,
            Self::Rgba8 => 4,
        }
    }
}

/// How texels are sampled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Filtering {
    Nearest,
    Linear,
}

/// How mipmap levels are blended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum MipmapFiltering {
    Nearest,
    Linear,
}

/// What happens outside of `0..1` texture coordinates.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Wrapping {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

impl Wrapping {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Repeat => REPEAT,
            Self::MirroredRepeat => MIRRORED_REPEAT,
            Self::ClampToEdge => CLAMP_TO_EDGE,
            Self::ClampToBorder => CLAMP_TO_BORDER,
        }
    }
}

/// Everything about a texture except its contents.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureFormat {
    /// Layout of one pixel.
    pub pixel_format: PixelFormat,
    /// Width and height of level 0.
    pub size: UVec2,
    /// Number of layers of an array texture, `0` for a plain 2d texture.
    pub layers: u32,
    /// Min/mag filter.
    pub filtering: Filtering,
    /// Number of mipmap levels including level 0. `1` means no mipmaps.
    pub mipmap_levels: u32,
    /// Only relevant if `mipmap_levels` is more than `1`.
    pub mipmap_filtering: MipmapFiltering,
    #[allow(missing_docs)]
    pub wrapping_x: Wrapping,
    #[allow(missing_docs)]
    pub wrapping_y: Wrapping,
}

impl Default for TextureFormat {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgba8,
            size: UVec2::ZERO,
            layers: 0,
            filtering: Filtering::Nearest,
            mipmap_levels: 1,
            mipmap_filtering: MipmapFiltering::Nearest,
            wrapping_x: Wrapping::Repeat,
            wrapping_y: Wrapping::Repeat,
        }
    }
}

impl TextureFormat {
    /// Size of level 0 (all layers) in bytes.
    pub fn byte_size(&self) -> usize {
        let pixels = self.size.x as usize * self.size.y as usize;
        pixels * self.pixel_format.pixel_size() * self.layers.max(1) as usize
    }

    /// Returns true if there's more than one mipmap level.
    pub fn has_mipmaps(&self) -> bool {
        self.mipmap_levels > 1
    }

    /// The `GL_TEXTURE_MIN_FILTER` value.
    pub fn min_filter(&self) -> u32 {
        if self.has_mipmaps() {
            match (self.mipmap_filtering, self.filtering) {
                (MipmapFiltering::Nearest, Filtering::Nearest) => NEAREST_MIPMAP_NEAREST,
                (MipmapFiltering::Nearest, Filtering::Linear) => LINEAR_MIPMAP_NEAREST,
                (MipmapFiltering::Linear, Filtering::Nearest) => NEAREST_MIPMAP_LINEAR,
                (MipmapFiltering::Linear, Filtering::Linear) => LINEAR_MIPMAP_LINEAR,
            }
        } else {
            self.mag_filter()
        }
    }

    /// The `GL_TEXTURE_MAG_FILTER` value.
    pub fn mag_filter(&self) -> u32 {
        match self.filtering {
            Filtering::Nearest => NEAREST,
            Filtering::Linear => LINEAR,
        }
    }

    /// Returns false (after logging why) if the driver can't make a texture this big.
    fn check_size(&self, max: u32) -> bool {
        if self.size.x > max || self.size.y > max {
            error!(
                "tried to make texture with size {} {}, maximum size supported is {}",
                self.size.x, self.size.y, max
            );
            false
        } else {
            true
        }
    }
}

/// Whether `context` can hold a texture of `format`. Logs an error if not.
fn can_make<G: GlApi>(context: &Context<G>, format: &TextureFormat) -> bool {
    if context.texture_units() == 0 {
        error!("tried to make texture without texture units");
        return false;
    }
    format.check_size(context.gl().max_texture_size())
}

/// Sets filtering and wrapping of the texture bound as `target`.
fn apply_parameters<G: GlApi>(gl: &G, target: TextureTarget, format: &TextureFormat) {
    gl.tex_parameter(target, TextureParameter::MagFilter, format.mag_filter());
    gl.tex_parameter(target, TextureParameter::MinFilter, format.min_filter());
    gl.tex_parameter(target, TextureParameter::WrapS, format.wrapping_x.to_gl());
    gl.tex_parameter(target, TextureParameter::WrapT, format.wrapping_y.to_gl());
}

/// A texture that can be bound to a [`Sampler`][`crate::Sampler`].
pub trait SampledTexture {
    /// What the texture is bound as.
    const TARGET: TextureTarget;

    /// The qualified driver name.
    fn handle(&self) -> Qualified;
}

/// A 2d array of pixels.
pub struct Texture2d<G: GlApi> {
    context: Rc<Context<G>>,
    handle: Qualified,
    format: TextureFormat,
}

impl<G: GlApi> Texture2d<G> {
    /// Makes a texture, filled with `data` if it isn't empty. Returns `None` (after logging an
    /// error) if the texture is too big or `data` is the wrong size for `format`.
    pub fn make(
        context: &Rc<Context<G>>,
        mut format: TextureFormat,
        data: Option<&[u8]>,
    ) -> Option<Self> {
        format.layers = 0;
        if !can_make(context, &format) {
            return None;
        }

        let data = data.filter(|d| !d.is_empty());
        if let Some(data) = data {
            if data.len() != format.byte_size() {
                error!(
                    "mismatched byte size when trying to load texture, wanted {}, have {}",
                    format.byte_size(),
                    data.len()
                );
                return None;
            }
        }

        let raw = context.gl().create_texture();
        let texture = Self {
            context: Rc::clone(context),
            handle: Qualified::new(raw, context.next_qualifier()),
            format,
        };
        texture.bind();

        let gl = context.gl();
        gl.tex_image(TextureTarget::Texture2d, &format, data);
        apply_parameters(gl, TextureTarget::Texture2d, &format);
        Some(texture)
    }

    /// Binds it to the active texture unit.
    pub fn bind(&self) {
        let unit = self.context.active_unit();
        self.context
            .bind_texture(self.handle, TextureTarget::Texture2d, unit);
    }

    /// Changes the wrapping if it differs.
    pub fn set_wrapping(&mut self, x: Wrapping, y: Wrapping) {
        if self.format.wrapping_x != x || self.format.wrapping_y != y {
            self.bind();
            self.format.wrapping_x = x;
            self.format.wrapping_y = y;
            let gl = self.context.gl();
            gl.tex_parameter(TextureTarget::Texture2d, TextureParameter::WrapS, x.to_gl());
            gl.tex_parameter(TextureTarget::Texture2d, TextureParameter::WrapT, y.to_gl());
        }
    }

    /// Fills the levels after 0 from level 0.
    pub fn generate_mipmap(&self) {
        self.bind();
        self.context.gl().generate_mipmap(TextureTarget::Texture2d);
    }

    /// The format it was made with (and current wrapping).
    pub fn format(&self) -> &TextureFormat {
        &self.format
    }

    /// Width and height.
    pub fn size(&self) -> UVec2 {
        self.format.size
    }
}

impl<G: GlApi> SampledTexture for Texture2d<G> {
    const TARGET: TextureTarget = TextureTarget::Texture2d;

    fn handle(&self) -> Qualified {
        self.handle
    }
}

impl<G: GlApi> Drop for Texture2d<G> {
    fn drop(&mut self) {
        self.context.gl().delete_texture(self.handle.raw);
    }
}

/// A stack of equally sized 2d textures, sampled with a layer coordinate.
pub struct Texture2dArray<G: GlApi> {
    context: Rc<Context<G>>,
    handle: Qualified,
    format: TextureFormat,
}

impl<G: GlApi> Texture2dArray<G> {
    /// Allocates `format.layers` layers (and `format.mipmap_levels` levels). Returns `None` (after
    /// logging an error) if the texture is too big or has no layers.
    pub fn make(context: &Rc<Context<G>>, format: TextureFormat) -> Option<Self> {
        if !can_make(context, &format) {
            return None;
        }
        if format.layers == 0 {
            error!("tried to make array texture without layers");
            return None;
        }

        let raw = context.gl().create_texture();
        let texture = Self {
            context: Rc::clone(context),
            handle: Qualified::new(raw, context.next_qualifier()),
            format,
        };
        texture.bind();

        let gl = context.gl();
        gl.tex_image(TextureTarget::Texture2dArray, &format, None);
        apply_parameters(gl, TextureTarget::Texture2dArray, &format);
        Some(texture)
    }

    /// Binds it to the active texture unit.
    pub fn bind(&self) {
        self.context.bind_texture(
            self.handle,
            TextureTarget::Texture2dArray,
            self.context.active_unit(),
        );
    }

    /// The format it was made with.
    pub fn format(&self) -> &TextureFormat {
        &self.format
    }

    /// Width and height of each layer.
    pub fn size(&self) -> UVec2 {
        self.format.size
    }

    /// Number of layers.
    pub fn layers(&self) -> u32 {
        self.format.layers
    }
}

impl<G: GlApi> SampledTexture for Texture2dArray<G> {
    const TARGET: TextureTarget = TextureTarget::Texture2dArray;

    fn handle(&self) -> Qualified {
        self.handle
    }
}

impl<G: GlApi> Drop for Texture2dArray<G> {
    fn drop(&mut self) {
        self.context.gl().delete_texture(self.handle.raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ShaderVersion;
    use crate::testing::{Call, RecordingGl};

    fn format(x: u32, y: u32) -> TextureFormat {
        TextureFormat {
            pixel_format: PixelFormat::Rgba8,
            size: UVec2::new(x, y),
            ..Default::default()
        }
    }

    #[test]
    fn test_byte_size() {
        assert_eq!(format(4, 2).byte_size(), 32);
        let r16 = TextureFormat {
            pixel_format: PixelFormat::R16,
            layers: 3,
            ..format(4, 4)
        };
        assert_eq!(r16.byte_size(), 96);
    }

    #[test]
    fn test_min_filter() {
        let mut format = format(1, 1);
        format.filtering = Filtering::Linear;
        assert_eq!(format.min_filter(), LINEAR);
        format.mipmap_levels = 4;
        assert_eq!(format.min_filter(), LINEAR_MIPMAP_NEAREST);
        format.mipmap_filtering = MipmapFiltering::Linear;
        assert_eq!(format.min_filter(), LINEAR_MIPMAP_LINEAR);
        assert_eq!(format.mag_filter(), LINEAR);
    }

    #[test]
    fn test_make() {
        let context = Context::new(RecordingGl::default(), ShaderVersion::Glsl330);
        let data = vec![0u8; 16];
        let texture = Texture2d::make(&context, format(2, 2), Some(&data)).unwrap();
        assert_eq!(texture.size(), UVec2::new(2, 2));
        let calls = context.gl().take_calls();
        assert_eq!(
            &calls[..3],
            &[
                Call::CreateTexture(1),
                Call::BindTexture(TextureTarget::Texture2d, 1),
                Call::TexImage(TextureTarget::Texture2d, UVec2::new(2, 2), 0),
            ]
        );
        assert_eq!(calls.len(), 7);
    }

    #[test]
    fn test_make_fails() {
        let gl = RecordingGl::with_max_texture_size(64);
        let context = Context::new(gl, ShaderVersion::Glsl330);
        assert!(Texture2d::make(&context, format(128, 1), None).is_none());
        let short = [0u8; 15];
        let made = Texture2d::make(&context, format(2, 2), Some(&short));
        assert!(made.is_none());
        assert!(Texture2dArray::make(&context, format(65, 1)).is_none());
        assert!(Texture2dArray::make(&context, format(2, 2)).is_none());
        assert!(context.gl().take_calls().is_empty());

        // Empty data is the same as none.
        assert!(Texture2d::make(&context, format(2, 2), Some(&[])).is_some());
    }

    #[test]
    fn test_make_without_units() {
        let gl = RecordingGl::with_texture_units(0);
        let context = Context::new(gl, ShaderVersion::Glsl330);
        assert!(Texture2d::make(&context, format(2, 2), None).is_none());
        let layered = TextureFormat {
            layers: 2,
            ..format(2, 2)
        };
        assert!(Texture2dArray::make(&context, layered).is_none());
        assert!(context.gl().take_calls().is_empty());
        assert_eq!(context.bound_texture(0), (Qualified::NONE, None));
    }

    #[test]
    fn test_set_wrapping() {
        let context = Context::new(RecordingGl::default(), ShaderVersion::Glsl330);
        let mut texture = Texture2d::make(&context, format(1, 1), None).unwrap();
        context.gl().take_calls();

        texture.set_wrapping(Wrapping::Repeat, Wrapping::Repeat);
        assert!(context.gl().take_calls().is_empty());

        texture.set_wrapping(Wrapping::ClampToEdge, Wrapping::Repeat);
        let target = TextureTarget::Texture2d;
        assert_eq!(
            context.gl().take_calls(),
            vec![
                Call::TexParameter(target, TextureParameter::WrapS, CLAMP_TO_EDGE),
                Call::TexParameter(target, TextureParameter::WrapT, REPEAT),
            ]
        );
    }

    #[test]
    fn test_array() {
        let context = Context::new(RecordingGl::default(), ShaderVersion::Glsl330);
        let array = Texture2dArray::make(
            &context,
            TextureFormat {
                layers: 4,
                mipmap_levels: 3,
                ..format(8, 8)
            },
        )
        .unwrap();
        assert_eq!(array.layers(), 4);

        let calls = context.gl().take_calls();
        assert!(calls.contains(&Call::TexImage(
            TextureTarget::Texture2dArray,
            UVec2::new(8, 8),
            4
        )));
        assert!(calls.contains(&Call::TexParameter(
            TextureTarget::Texture2dArray,
            TextureParameter::MinFilter,
            NEAREST_MIPMAP_NEAREST
        )));

        drop(array);
        assert_eq!(context.gl().take_calls(), vec![Call::DeleteTexture(1)]);
    }
}
