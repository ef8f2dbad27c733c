// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::qualifier::Qualifier;
use linear_map::LinearMap;
use std::rc::Rc;

/// What the [`Context`][`crate::Context`] knows about a live [`Program`][`crate::Program`].
#[derive(Clone, Debug)]
pub struct ProgramDescription {
    /// Qualifier of the program that owns the raw name.
    pub qualifier: Qualifier,
    /// If the application wants this program recompiled when its sources change.
    pub auto_reload: bool,
    /// Vertex source, before prefix rewriting.
    pub vertex: Rc<str>,
    /// Fragment source, before prefix rewriting.
    pub fragment: Rc<str>,
}

/// Live programs by raw name. Entries are keyed by name (not address) so moving a
/// [`Program`][`crate::Program`] around needs no bookkeeping.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    // Use a LinearMap because there are relatively few programs.
    programs: LinearMap<u32, ProgramDescription>,
}

impl ProgramRegistry {
    /// Registers a newly linked program. Registering a raw name twice is a bug.
    pub fn register(&mut self, raw: u32, description: ProgramDescription) {
        if raw == 0 {
            return;
        }
        let previous = self.programs.insert(raw, description);
        assert!(previous.is_none(), "program {} registered twice", raw);
    }

    /// Unregisters a program that is being deleted, returning its description.
    pub fn unregister(&mut self, raw: u32, qualifier: Qualifier) -> Option<ProgramDescription> {
        if raw == 0 {
            return None;
        }
        let description = self.programs.remove(&raw);
        if let Some(description) = &description {
            assert_eq!(
                description.qualifier, qualifier,
                "program {} unregistered by a stale owner",
                raw
            );
        }
        description
    }

    /// Looks up a live program by raw name.
    pub fn lookup(&self, raw: u32) -> Option<&ProgramDescription> {
        self.programs.get(&raw)
    }

    /// Flags a program for (or exempts it from) automatic reloading.
    pub fn set_auto_reload(&mut self, raw: u32, auto_reload: bool) {
        if let Some(description) = self.programs.get_mut(&raw) {
            description.auto_reload = auto_reload;
        }
    }

    /// Raw names of programs flagged for automatic reloading.
    pub fn auto_reload(&self) -> impl Iterator<Item = u32> + '_ {
        self.programs
            .iter()
            .filter(|(_, d)| d.auto_reload)
            .map(|(&raw, _)| raw)
    }

    /// Number of live programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Returns true if no programs are live.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
