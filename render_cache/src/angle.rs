// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use glam::Vec2;
use std::f32::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A rotation in radians, kept in `-PI..PI`. Per instance attributes store it as its radians
/// (see [`CachedValue`][`crate::CachedValue`]).
#[derive(Copy, Clone, Default, PartialEq, PartialOrd)]
pub struct Angle(f32);

impl Angle {
    #[allow(missing_docs)]
    pub const ZERO: Self = Self(0.0);
    /// Half a revolution. Wraps to `-PI`.
    pub const PI: Self = Self(-PI);
    #[allow(missing_docs)]
    pub const PI_2: Self = Self(PI / 2.0);

    #[allow(missing_docs)]
    pub fn from_radians(radians: f32) -> Self {
        Self(wrap(radians))
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn to_radians(self) -> f32 {
        self.0
    }

    #[allow(missing_docs)]
    pub fn from_degrees(degrees: f32) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    #[allow(missing_docs)]
    pub fn to_degrees(self) -> f32 {
        self.0.to_degrees()
    }

    /// Angle of a vector from the positive x axis.
    pub fn from_atan2(y: f32, x: f32) -> Self {
        Self::from_radians(y.atan2(x))
    }

    /// Unit vector pointing in this direction.
    #[inline]
    pub fn to_vec(self) -> Vec2 {
        let (sin, cos) = self.0.sin_cos();
        Vec2::new(cos, sin)
    }

    /// Magnitude of the angle, in `0..=PI`.
    pub fn abs(self) -> f32 {
        self.0.abs()
    }

    /// Shortest rotation from `self` towards `other`, scaled by `value`.
    pub fn lerp(self, other: Self, value: f32) -> Self {
        self + (other - self) * value
    }
}

/// Maps radians into `-PI..PI`.
fn wrap(radians: f32) -> f32 {
    let wrapped = (radians + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU.
    if wrapped >= PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

impl From<Angle> for f32 {
    fn from(angle: Angle) -> Self {
        angle.to_radians()
    }
}

impl Add for Angle {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::from_radians(self.0 + other.0)
    }
}

impl AddAssign for Angle {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Angle {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::from_radians(self.0 - other.0)
    }
}

impl SubAssign for Angle {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::ZERO - self
    }
}

impl Mul<f32> for Angle {
    type Output = Self;

    fn mul(self, other: f32) -> Self::Output {
        Self::from_radians(self.0 * other)
    }
}

impl fmt::Debug for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} degrees", self.to_degrees())
    }
}
