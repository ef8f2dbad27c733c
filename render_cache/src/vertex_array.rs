// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::Context;
use crate::gl::*;
use crate::qualifier::Qualified;
use std::rc::Rc;

/// Remembers which buffers feed which vertex attributes. Attribute layout is up to the caller,
/// who does it with the array bound.
pub struct VertexArray<G: GlApi> {
    context: Rc<Context<G>>,
    handle: Qualified,
}

impl<G: GlApi> VertexArray<G> {
    /// Creates an empty vertex array.
    pub fn new(context: &Rc<Context<G>>) -> Self {
        let raw = context.gl().create_vertex_array();
        Self {
            handle: Qualified::new(raw, context.next_qualifier()),
            context: Rc::clone(context),
        }
    }

    /// Binds it (if it isn't already).
    pub fn bind(&self) {
        self.context.bind_vertex_array(self.handle);
    }

    /// Draws `count` vertices starting at `first`.
    pub fn draw(&self, primitive: Primitive, first: u32, count: u32) {
        self.context
            .draw_arrays(self.handle, primitive, first, count);
    }

    /// Draws `instances` instances of `count` vertices starting at `first`.
    pub fn draw_instanced(&self, primitive: Primitive, first: u32, count: u32, instances: u32) {
        self.context
            .draw_arrays_instanced(self.handle, primitive, first, count, instances);
    }

    /// The qualified driver name.
    pub fn handle(&self) -> Qualified {
        self.handle
    }
}

impl<G: GlApi> Drop for VertexArray<G> {
    fn drop(&mut self) {
        self.context.gl().delete_vertex_array(self.handle.raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ShaderVersion;
    use crate::testing::{Call, RecordingGl};

    #[test]
    fn test_draw() {
        let context = Context::new(RecordingGl::default(), ShaderVersion::Glsl330);
        let a = VertexArray::new(&context);
        let b = VertexArray::new(&context);
        a.draw(Primitive::Triangles, 0, 3);
        a.draw(Primitive::Triangles, 3, 3);
        b.draw_instanced(Primitive::TriangleStrip, 0, 4, 8);
        a.bind();
        assert_eq!(
            context.gl().take_calls(),
            vec![
                Call::CreateVertexArray(1),
                Call::CreateVertexArray(2),
                Call::BindVertexArray(1),
                Call::DrawArrays(Primitive::Triangles, 0, 3, 1),
                Call::DrawArrays(Primitive::Triangles, 3, 3, 1),
                Call::BindVertexArray(2),
                Call::DrawArrays(Primitive::TriangleStrip, 0, 4, 8),
                Call::BindVertexArray(1),
            ]
        );
        assert_eq!(context.this_frame().vertex_array_switches, 3);
        assert_eq!(context.this_frame().draw_calls, 3);
    }
}
