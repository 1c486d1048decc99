//! Type-distinct memory tiers (spec §9's design note): the original threads
//! raw pointers between a small fast scratchpad and a larger slow local
//! store; here the two are distinct types so that mixing them is a compile
//! error rather than a runtime corruption.

use crate::error::{Error, Result};

/// A bounded fast-tier window holding at most `CAPACITY` items, used as a
/// streaming copy/prefetch buffer by the sorter (C7) and counter (C9).
#[derive(Debug, Clone)]
pub struct Scratchpad<T, const CAPACITY: usize> {
    data: Vec<T>,
}

impl<T: Copy, const CAPACITY: usize> Scratchpad<T, CAPACITY> {
    pub fn new() -> Self {
        Scratchpad { data: Vec::with_capacity(CAPACITY) }
    }

    /// Loads `items` into the window. Fails with `Error::Accelerator` if it
    /// would not fit, matching the original's scratchpad-size assertion
    /// (spec §7's accelerator invariant-violation category).
    pub fn load(&mut self, items: &[T]) -> Result<()> {
        if items.len() > CAPACITY {
            return Err(Error::Accelerator(format!("scratchpad overflow: {} > {CAPACITY}", items.len())));
        }
        self.data.clear();
        self.data.extend_from_slice(items);
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Copy, const CAPACITY: usize> Default for Scratchpad<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// The larger, slower tier: a borrowed view of the accelerator's full
/// reservoir/sample array. Reads and writes are range-checked but otherwise
/// unbounded, unlike `Scratchpad`'s fixed capacity.
pub struct LocalStore<'a, T> {
    data: &'a mut [T],
}

/// A borrowed view into a `LocalStore` range, handed to callers instead of
/// a raw slice so reads and writes stay attributable to the tier they came
/// from.
pub struct Window<'a, T> {
    pub range: std::ops::Range<usize>,
    pub items: &'a [T],
}

impl<'a, T: Copy> LocalStore<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        LocalStore { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read(&self, range: std::ops::Range<usize>) -> Window<'_, T> {
        Window { items: &self.data[range.clone()], range }
    }

    /// Writes `items` back into the local store at `range`. The caller is
    /// responsible for `items` having come from a read (or scratchpad load)
    /// of a range it is now entitled to overwrite — scratchpad streaming
    /// copies legitimately read one range and write another during Phase C.
    pub fn write(&mut self, range: std::ops::Range<usize>, items: &[T]) {
        self.data[range].copy_from_slice(items);
    }

    pub fn as_slice(&self) -> &[T] {
        self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edge;

    #[test]
    fn scratchpad_rejects_overflow() {
        let mut pad: Scratchpad<Edge, 2> = Scratchpad::new();
        let edges = [Edge { u: 0, v: 1 }, Edge { u: 1, v: 2 }];
        pad.load(&edges).unwrap();
        assert_eq!(pad.len(), 2);
    }

    #[test]
    fn scratchpad_overflow_is_an_accelerator_error() {
        let mut pad: Scratchpad<Edge, 1> = Scratchpad::new();
        let edges = [Edge { u: 0, v: 1 }, Edge { u: 1, v: 2 }];
        let err = pad.load(&edges).unwrap_err();
        assert!(matches!(err, Error::Accelerator(_)));
    }

    #[test]
    fn local_store_read_write_round_trips() {
        let mut data = vec![Edge { u: 0, v: 0 }; 4];
        let mut store = LocalStore::new(&mut data);
        let replacement = [Edge { u: 9, v: 10 }, Edge { u: 11, v: 12 }];
        store.write(1..3, &replacement);
        let window = store.read(1..3);
        assert_eq!(window.items, &replacement);
    }
}
