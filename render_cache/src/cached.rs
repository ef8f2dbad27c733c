// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per instance attributes that are recomputed every frame but rarely change. A [`CachedValue`]
//! remembers what it last wrote into a record of a [`RenderInfo`] and only writes again when the
//! value changes.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Identifies one batch of one [`RenderInfo`]. Attachments made before a
/// [`clear`][`RenderInfo::clear`] are invalid afterwards.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Source {
    identity: u64,
    epoch: u64,
}

/// A batch of per instance records (e.g. destined for an instance buffer).
#[derive(Debug)]
pub struct RenderInfo<I> {
    data: Vec<I>,
    identity: u64,
    epoch: u64,
}

impl<I> Default for RenderInfo<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> RenderInfo<I> {
    /// Creates an empty collection, distinct from every other.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            identity: NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
        }
    }

    /// Pushes a record, returning its index.
    pub fn add(&mut self, item: I) -> usize {
        self.data.push(item);
        self.data.len() - 1
    }

    /// Pushes copies of all of `other`'s records. They aren't attached to anything.
    pub fn append(&mut self, other: &Self)
    where
        I: Clone,
    {
        self.data.extend_from_slice(&other.data);
    }

    /// Gets a record.
    pub fn get(&self, index: usize) -> Option<&I> {
        self.data.get(index)
    }

    /// Records `begin..end`. Panics if it's out of range.
    pub fn sub_span(&self, begin: usize, end: usize) -> &[I] {
        assert!(begin <= end, "sub span {}..{} reversed", begin, end);
        let len = self.data.len();
        assert!(end <= len, "sub span {}..{} out of range", begin, end);
        &self.data[begin..end]
    }

    /// All records.
    pub fn as_slice(&self) -> &[I] {
        &self.data
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Removes all records and starts a new batch, detaching every cached value.
    pub fn clear(&mut self) {
        self.data.clear();
        self.epoch += 1;
    }

    /// Starts attaching cached values to record `index`.
    pub fn attach(&self, index: usize) -> CachedValueInitializer<I> {
        CachedValueInitializer {
            source: self.source(),
            index,
            info: PhantomData,
        }
    }

    fn source(&self) -> Source {
        Source {
            identity: self.identity,
            epoch: self.epoch,
        }
    }

    /// Writes `value` into `index` if `source` is the current batch and `index` exists.
    fn write<T>(&mut self, source: Source, index: usize, setter: fn(&mut I, T), value: T) -> bool {
        if source != self.source() {
            return false;
        }
        match self.data.get_mut(index) {
            Some(item) => {
                setter(item, value);
                true
            }
            None => false,
        }
    }
}

/// One value of one record.
pub struct CachedValue<I, T> {
    value: T,
    setter: fn(&mut I, T),
    attachment: Option<(Source, usize)>,
}

impl<I, T: Clone + PartialEq> CachedValue<I, T> {
    /// Creates a detached value. `setter` writes it into a record, converting it if needed
    /// (e.g. an [`Angle`][`crate::Angle`] to radians).
    pub fn new(value: T, setter: fn(&mut I, T)) -> Self {
        Self {
            value,
            setter,
            attachment: None,
        }
    }

    /// The last value set or sent.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Changes the value without writing it anywhere.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    /// Writes `value` into the attached record if it differs from the last value and the record
    /// is still valid. The value is remembered either way.
    pub fn send(&mut self, info: &mut RenderInfo<I>, value: T) {
        if self.value != value {
            if let Some((source, index)) = self.attachment {
                info.write(source, index, self.setter, value.clone());
            }
        }
        self.value = value;
    }

    /// Writes the current value into the attached record if it's still valid.
    pub fn resend(&self, info: &mut RenderInfo<I>) {
        if let Some((source, index)) = self.attachment {
            info.write(source, index, self.setter, self.value.clone());
        }
    }

    /// Returns true if a send would reach `info`.
    pub fn is_valid(&self, info: &RenderInfo<I>) -> bool {
        match self.attachment {
            Some((source, index)) => source == info.source() && index < info.len(),
            None => false,
        }
    }

    /// Detaches and resets the value.
    pub fn clear(&mut self, reset: T) {
        self.attachment = None;
        self.value = reset;
    }
}

/// One value shared by many records of one collection.
pub struct CachedValues<I, T> {
    value: T,
    setter: fn(&mut I, T),
    source: Option<Source>,
    indices: Vec<usize>,
}

impl<I, T: Clone + PartialEq> CachedValues<I, T> {
    /// Creates a detached value. See [`CachedValue::new`].
    pub fn new(value: T, setter: fn(&mut I, T)) -> Self {
        Self {
            value,
            setter,
            source: None,
            indices: Vec::new(),
        }
    }

    /// The last value set or sent.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Changes the value without writing it anywhere.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    /// Writes `value` into every attached record if it differs from the last value and the
    /// records are still valid. The value is remembered either way.
    pub fn send(&mut self, info: &mut RenderInfo<I>, value: T) {
        if self.value != value {
            self.write(info, &value);
        }
        self.value = value;
    }

    /// Writes the current value into every attached record if they're still valid.
    pub fn resend(&self, info: &mut RenderInfo<I>) {
        self.write(info, &self.value);
    }

    fn write(&self, info: &mut RenderInfo<I>, value: &T) {
        if let Some(source) = self.source {
            for &index in &self.indices {
                info.write(source, index, self.setter, value.clone());
            }
        }
    }

    /// Indices of attached records.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Detaches from all records and resets the value.
    pub fn clear(&mut self, reset: T) {
        self.source = None;
        self.indices.clear();
        self.value = reset;
    }
}

/// Attaches cached values to one record. Get one with [`RenderInfo::attach`].
pub struct CachedValueInitializer<I> {
    source: Source,
    index: usize,
    info: PhantomData<fn(&mut I)>,
}

impl<I> CachedValueInitializer<I> {
    /// Attaches `value` to the record, replacing any previous attachment.
    pub fn init<T>(&self, value: &mut CachedValue<I, T>) -> &Self {
        value.attachment = Some((self.source, self.index));
        self
    }

    /// Adds the record to `values`. Panics if `values` is attached to a different collection or
    /// batch (it must be [`clear`][`CachedValues::clear`]ed first).
    pub fn init_many<T>(&self, values: &mut CachedValues<I, T>) -> &Self {
        assert!(
            values.source.map_or(true, |s| s == self.source),
            "cached values attached to two collections"
        );
        values.source = Some(self.source);
        values.indices.push(self.index);
        self
    }
}
