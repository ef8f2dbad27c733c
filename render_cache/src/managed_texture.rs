// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::gl::GlApi;
use crate::texture::Texture2d;
use std::rc::{Rc, Weak};

/// Owns a [`Texture2d`] that any number of [`ManagedTexture`]s refer to without keeping it alive.
/// Whoever holds the storage (e.g. a texture cache) can check [`unused`][`Self::unused`] and drop
/// it, which deletes the texture and empties every handle.
pub struct ManagedTextureStorage<G: GlApi> {
    texture: Rc<Texture2d<G>>,
}

impl<G: GlApi> ManagedTextureStorage<G> {
    /// Takes ownership of `texture`.
    pub fn make(texture: Texture2d<G>) -> Self {
        Self {
            texture: Rc::new(texture),
        }
    }

    /// True if no handle refers to the texture and nothing is borrowing it through
    /// [`ManagedTexture::get`].
    pub fn unused(&self) -> bool {
        Rc::strong_count(&self.texture) == 1 && Rc::weak_count(&self.texture) == 0
    }

    /// A new handle to the texture.
    pub fn managed_texture(&self) -> ManagedTexture<G> {
        ManagedTexture {
            texture: Rc::downgrade(&self.texture),
        }
    }

    /// The texture itself.
    pub fn texture(&self) -> &Texture2d<G> {
        &self.texture
    }
}

/// A handle to the texture of a [`ManagedTextureStorage`]. Cloning it adds a user, dropping or
/// [`reset`][`Self::reset`]ing it removes one.
pub struct ManagedTexture<G: GlApi> {
    texture: Weak<Texture2d<G>>,
}

impl<G: GlApi> ManagedTexture<G> {
    /// The texture, unless its storage was dropped (or this is a default handle).
    pub fn get(&self) -> Option<Rc<Texture2d<G>>> {
        self.texture.upgrade()
    }

    /// Stops referring to the texture.
    pub fn reset(&mut self) {
        self.texture = Weak::new();
    }
}

impl<G: GlApi> Clone for ManagedTexture<G> {
    fn clone(&self) -> Self {
        Self {
            texture: Weak::clone(&self.texture),
        }
    }
}

/// Refers to nothing.
impl<G: GlApi> Default for ManagedTexture<G> {
    fn default() -> Self {
        Self {
            texture: Weak::new(),
        }
    }
}
