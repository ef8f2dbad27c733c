// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::Context;
use crate::gl::*;
use crate::qualifier::Qualified;
use bytemuck::Pod;
use std::mem::size_of;
use std::rc::Rc;

/// A chunk of driver memory (vertices, indices, texture buffer storage, ...). Remembers the
/// size of the elements it was last filled with so a [`BufferTexture`][`crate::BufferTexture`]
/// can check that they match its format.
pub struct Buffer<G: GlApi> {
    context: Rc<Context<G>>,
    handle: Qualified,
    element_size: usize,
    len: usize,
}

impl<G: GlApi> Buffer<G> {
    /// Creates an empty buffer.
    pub fn new(context: &Rc<Context<G>>) -> Self {
        let raw = context.gl().create_buffer();
        Self {
            handle: Qualified::new(raw, context.next_qualifier()),
            context: Rc::clone(context),
            element_size: 0,
            len: 0,
        }
    }

    /// Binds the buffer to `target` (if it isn't already).
    pub fn bind(&self, target: BufferTarget) {
        self.context.bind_buffer(target, self.handle);
    }

    /// Replaces the contents with `data`.
    pub fn set<T: Pod>(&mut self, data: &[T], usage: BufferUsage, target: BufferTarget) {
        let bytes = bytemuck::cast_slice(data);
        self.upload(size_of::<T>(), data.len(), Some(bytes), usage, target);
    }

    /// Allocates room for `len` elements of `element_size` bytes without filling it. The contents
    /// are undefined until written by the driver (e.g. a pixel pack).
    pub fn allocate(
        &mut self,
        element_size: usize,
        len: usize,
        usage: BufferUsage,
        target: BufferTarget,
    ) {
        self.upload(element_size, len, None, usage, target);
    }

    fn upload(
        &mut self,
        element_size: usize,
        len: usize,
        bytes: Option<&[u8]>,
        usage: BufferUsage,
        target: BufferTarget,
    ) {
        let size = element_size * len;
        self.bind(target);
        self.context.gl().buffer_data(target, size, bytes, usage);
        self.context.tally_buffer_bytes(size);
        self.element_size = element_size;
        self.len = len;
    }

    /// The qualified driver name.
    pub fn handle(&self) -> Qualified {
        self.handle
    }

    /// Size of one element in bytes, as of the last upload.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Number of elements, as of the last upload.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total size in bytes.
    pub fn byte_len(&self) -> usize {
        self.element_size * self.len
    }

    pub(crate) fn context(&self) -> &Rc<Context<G>> {
        &self.context
    }
}

impl<G: GlApi> Drop for Buffer<G> {
    fn drop(&mut self) {
        self.context.gl().delete_buffer(self.handle.raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ShaderVersion;
    use crate::testing::{Call, RecordingGl};

    #[test]
    fn test_set() {
        let context = Context::new(RecordingGl::default(), ShaderVersion::Glsl330);
        let mut buffer = Buffer::new(&context);
        let target = BufferTarget::Array;
        buffer.set(&[1.0f32, 2.0, 3.0], BufferUsage::StaticDraw, target);
        buffer.set(&[[1u32; 3]; 2], BufferUsage::DynamicDraw, target);
        assert_eq!(buffer.element_size(), 12);
        assert_eq!(buffer.len(), 2);
        assert_eq!(
            context.gl().take_calls(),
            vec![
                Call::CreateBuffer(1),
                Call::BindBuffer(BufferTarget::Array, 1),
                Call::BufferData(BufferTarget::Array, 12, BufferUsage::StaticDraw),
                Call::BufferData(BufferTarget::Array, 24, BufferUsage::DynamicDraw),
            ]
        );

        let frame = context.this_frame();
        assert_eq!(frame.buffer_data_calls, 2);
        assert_eq!(frame.buffer_bytes, 36);
    }

    #[test]
    fn test_recreated_name() {
        let context = Context::new(RecordingGl::default(), ShaderVersion::Glsl330);
        let first = Buffer::new(&context);
        first.bind(BufferTarget::Array);
        let stale = first.handle();
        drop(first);

        // The driver hands out the same name again, but it must be bound anew.
        let second = Buffer::new(&context);
        assert_eq!(second.handle().raw, stale.raw);
        assert_ne!(second.handle(), stale);
        second.bind(BufferTarget::Array);
        assert_eq!(
            context.gl().take_calls(),
            vec![
                Call::CreateBuffer(1),
                Call::BindBuffer(BufferTarget::Array, 1),
                Call::DeleteBuffer(1),
                Call::CreateBuffer(1),
                Call::BindBuffer(BufferTarget::Array, 1),
            ]
        );
    }
}
