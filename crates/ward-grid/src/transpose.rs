// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::source::{Axis, CellFlags, CellRef, TabularSource};

/// Adapter that presents a wrapped source with rows and columns swapped, so
/// record-per-row data can be shown as one field per line.
///
/// Capability flags can be pinned per adapter cell; a pinned entry wins over
/// whatever the wrapped source reports for the mapped cell. Pins are keyed by
/// adapter coordinates and survive detaching and reattaching a source.
#[derive(Debug, Default)]
pub struct Transposed<S> {
    source: Option<S>,
    overrides: BTreeMap<CellRef, CellFlags>,
}

impl<S: TabularSource> Transposed<S> {
    pub fn new() -> Self {
        Self {
            source: None,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_source(source: S) -> Self {
        let mut adapter = Self::new();
        adapter.attach(source);
        adapter
    }

    /// Wraps a source, replacing any previous one. Flag pins are kept.
    pub fn attach(&mut self, source: S) -> Option<S> {
        self.source.replace(source)
    }

    pub fn detach(&mut self) -> Option<S> {
        self.source.take()
    }

    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    /// Adapter coordinate to wrapped-source coordinate. None when detached or
    /// out of range.
    pub fn map_to_source(&self, at: CellRef) -> Option<CellRef> {
        let source = self.source.as_ref()?;
        let mapped = at.transposed();
        source.contains(mapped).then_some(mapped)
    }

    /// Wrapped-source coordinate to adapter coordinate. None when detached or
    /// out of range.
    pub fn map_from_source(&self, at: CellRef) -> Option<CellRef> {
        let source = self.source.as_ref()?;
        source.contains(at).then(|| at.transposed())
    }

    /// Pins capability flags for one adapter cell. Ignored for out-of-range
    /// cells and for an empty flag set; use [`Self::reset_flags`] to clear.
    pub fn set_flags(&mut self, at: CellRef, flags: CellFlags) {
        if self.contains(at) && !flags.is_empty() {
            self.overrides.insert(at, flags);
        }
    }

    /// Removes the pin for one adapter cell, restoring pass-through flags.
    pub fn reset_flags(&mut self, at: CellRef) {
        if self.contains(at) {
            self.overrides.remove(&at);
        }
    }
}

impl<S: TabularSource> TabularSource for Transposed<S> {
    fn row_count(&self) -> usize {
        self.source.as_ref().map_or(0, TabularSource::column_count)
    }

    fn column_count(&self) -> usize {
        self.source.as_ref().map_or(0, TabularSource::row_count)
    }

    fn cell(&self, at: CellRef) -> Option<String> {
        let mapped = self.map_to_source(at)?;
        self.source.as_ref()?.cell(mapped)
    }

    fn set_cell(&mut self, at: CellRef, value: &str) -> bool {
        let Some(mapped) = self.map_to_source(at) else {
            return false;
        };
        match self.source.as_mut() {
            Some(source) => source.set_cell(mapped, value),
            None => false,
        }
    }

    fn header(&self, axis: Axis, section: usize) -> Option<String> {
        self.source.as_ref()?.header(axis.flipped(), section)
    }

    fn cell_flags(&self, at: CellRef) -> CellFlags {
        if self.contains(at)
            && let Some(flags) = self.overrides.get(&at)
        {
            return *flags;
        }
        match (self.map_to_source(at), self.source.as_ref()) {
            (Some(mapped), Some(source)) => source.cell_flags(mapped),
            _ => CellFlags::none(),
        }
    }
}
