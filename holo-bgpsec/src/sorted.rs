//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;

// Ordered set of elements, searched with a three-way comparison against the
// element key.
//
// The comparison closures return the ordering of the visited element
// relative to the searched key, as in `slice::binary_search_by`. Every
// level of the SKI cache index (upper ASN nodes, algorithm buckets, key
// records and update lists) is built on top of this type.
#[derive(Clone, Debug)]
pub struct SortedList<T>(Vec<T>);

// ===== impl SortedList =====

impl<T> SortedList<T> {
    pub fn get<F>(&self, cmp: F) -> Option<&T>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.0.binary_search_by(cmp).ok().map(|idx| &self.0[idx])
    }

    pub fn get_mut<F>(&mut self, cmp: F) -> Option<&mut T>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.0.binary_search_by(cmp).ok().map(|idx| &mut self.0[idx])
    }

    // Returns the element matching the key, inserting the one built by
    // `make` at its sorted position if none does. The returned flag tells
    // whether an insertion took place.
    pub fn get_or_insert_with<F, M>(
        &mut self,
        cmp: F,
        make: M,
    ) -> (&mut T, bool)
    where
        F: FnMut(&T) -> Ordering,
        M: FnOnce() -> T,
    {
        match self.0.binary_search_by(cmp) {
            Ok(idx) => (&mut self.0[idx], false),
            Err(idx) => {
                self.0.insert(idx, make());
                (&mut self.0[idx], true)
            }
        }
    }

    pub fn remove<F>(&mut self, cmp: F) -> Option<T>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.0
            .binary_search_by(cmp)
            .ok()
            .map(|idx| self.0.remove(idx))
    }

    // Keeps only the elements for which `f` returns true. Elements may be
    // modified, but not in a way that changes their relative order.
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.0.retain_mut(f)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for SortedList<T> {
    fn default() -> SortedList<T> {
        SortedList(Vec::new())
    }
}

impl<'a, T> IntoIterator for &'a SortedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ===== unit tests =====
