// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::ops::AddAssign;

/// How much work was handed to the driver during one frame.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Tally {
    /// Calls that uploaded buffer contents.
    pub buffer_data_calls: usize,
    /// Bytes uploaded to buffers.
    pub buffer_bytes: usize,
    /// Calls that uploaded uniform values (including sampler units).
    pub set_uniform_calls: usize,
    /// Bytes uploaded as uniforms.
    pub uniform_bytes: usize,
    /// Times the current program actually changed.
    pub program_switches: usize,
    /// Times the bound vertex array actually changed.
    pub vertex_array_switches: usize,
    /// Draw calls.
    pub draw_calls: usize,
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        self.buffer_data_calls += rhs.buffer_data_calls;
        self.buffer_bytes += rhs.buffer_bytes;
        self.set_uniform_calls += rhs.set_uniform_calls;
        self.uniform_bytes += rhs.uniform_bytes;
        self.program_switches += rhs.program_switches;
        self.vertex_array_switches += rhs.vertex_array_switches;
        self.draw_calls += rhs.draw_calls;
    }
}

/// The current frame's [`Tally`] and the last completed one.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Tallies {
    pub this_frame: Tally,
    pub last_frame: Tally,
}

impl Tallies {
    /// Moves this frame into last frame and starts over.
    pub fn cycle(&mut self) {
        self.last_frame = std::mem::take(&mut self.this_frame);
    }
}
