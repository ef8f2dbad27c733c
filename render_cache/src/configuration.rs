// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::gl::consts::*;

/// Whether blending is enabled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Blend {
    Enabled,
    Disabled,
}

/// Source and destination blend factors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendFunc {
    /// Non-premultiplied alpha.
    SrcAlphaOneMinusSrcAlpha,
    /// Premultiplied alpha.
    OneOneMinusSrcAlpha,
    /// `(SRC_ALPHA, ONE_MINUS_SRC_ALPHA)` for color, `(ONE_MINUS_DST_ALPHA, ONE)` for alpha.
    SeparateSrcAlphaOneMinusSrcAlphaOneMinusDstAlphaOne,
    /// Overwrite.
    OneZero,
    /// Keep destination.
    ZeroOne,
    /// Additive.
    OneOne,
    /// Multiplicative.
    DstColorZero,
}

impl BlendFunc {
    /// `(src_rgb, dst_rgb, src_alpha, dst_alpha)` factors.
    pub const fn factors(self) -> [u32; 4] {
        let (src, dst) = match self {
            Self::SrcAlphaOneMinusSrcAlpha => (SRC_ALPHA, ONE_MINUS_SRC_ALPHA),
            Self::OneOneMinusSrcAlpha => (ONE, ONE_MINUS_SRC_ALPHA),
            Self::SeparateSrcAlphaOneMinusSrcAlphaOneMinusDstAlphaOne => {
                return [SRC_ALPHA, ONE_MINUS_SRC_ALPHA, ONE_MINUS_DST_ALPHA, ONE]
            }
            Self::OneZero => (ONE, ZERO),
            Self::ZeroOne => (ZERO, ONE),
            Self::OneOne => (ONE, ONE),
            Self::DstColorZero => (DST_COLOR, ZERO),
        };
        [src, dst, src, dst]
    }

    /// True if the alpha factors differ from the color factors.
    pub const fn is_separate(self) -> bool {
        matches!(
            self,
            Self::SeparateSrcAlphaOneMinusSrcAlphaOneMinusDstAlphaOne
        )
    }
}

/// How source and destination are combined.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendEquation {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Add => FUNC_ADD,
            Self::Subtract => FUNC_SUBTRACT,
            Self::ReverseSubtract => FUNC_REVERSE_SUBTRACT,
            Self::Min => MIN,
            Self::Max => MAX,
        }
    }
}

/// Whether the depth test is enabled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum DepthTest {
    Enabled,
    Disabled,
}

/// Comparison of the depth test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum DepthFunc {
    Less,
    LessEqual,
    Always,
}

impl DepthFunc {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Less => LESS,
            Self::LessEqual => LEQUAL,
            Self::Always => ALWAYS,
        }
    }
}

/// Whether depth is written.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum DepthMask {
    Write,
    Keep,
}

/// How polygons are rasterized.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

impl PolygonMode {
    /// The underlying driver enum.
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Fill => FILL,
            Self::Line => LINE,
            Self::Point => POINT,
        }
    }
}

/// Whether writes to sRGB framebuffers are linear to sRGB converted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum SrgbMode {
    On,
    Off,
}

/// A full set of rasterizer/blend state. Pass to
/// [`Context::set_configuration`][`crate::Context::set_configuration`]; only the axes that differ
/// from what the context last set are sent to the driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub struct Configuration {
    pub blend: Blend,
    pub blend_func: BlendFunc,
    pub blend_equation: BlendEquation,
    pub depth_test: DepthTest,
    pub depth_func: DepthFunc,
    pub depth_mask: DepthMask,
    pub polygon_mode: PolygonMode,
    pub srgb_mode: SrgbMode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            blend: Blend::Enabled,
            blend_func: BlendFunc::SrcAlphaOneMinusSrcAlpha,
            blend_equation: BlendEquation::Add,
            depth_test: DepthTest::Disabled,
            depth_func: DepthFunc::Less,
            depth_mask: DepthMask::Write,
            polygon_mode: PolygonMode::Fill,
            srgb_mode: SrgbMode::On,
        }
    }
}

/// What the context believes the driver's state is. `None` means unknown, so the next request
/// for that axis always reaches the driver.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ConfigurationCache {
    pub blend: Option<Blend>,
    pub blend_func: Option<BlendFunc>,
    pub blend_equation: Option<BlendEquation>,
    pub depth_test: Option<DepthTest>,
    pub depth_func: Option<DepthFunc>,
    pub depth_mask: Option<DepthMask>,
    pub polygon_mode: Option<PolygonMode>,
    pub srgb_mode: Option<SrgbMode>,
}

/// Replaces `cached` with `requested`, returning true if they differed.
pub(crate) fn update_axis<T: PartialEq>(cached: &mut Option<T>, requested: T) -> bool {
    if cached.as_ref() == Some(&requested) {
        false
    } else {
        *cached = Some(requested);
        true
    }
}
