//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use arbitrary::Arbitrary;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::sorted::SortedList;

// Identifier of a route update pending path validation.
//
// The identifier is the path validation identity of the update: two updates
// with the same identifier are the same update as far as re-validation is
// concerned.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(new)]
#[derive(Arbitrary, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UpdateId(pub u32);

// Ordered set of updates depending on a key.
#[derive(Clone, Debug, Default)]
pub struct UpdateIdList(SortedList<UpdateId>);

// ===== impl UpdateId =====

impl From<u32> for UpdateId {
    fn from(id: u32) -> UpdateId {
        UpdateId(id)
    }
}

impl std::fmt::Display for UpdateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

// ===== impl UpdateIdList =====

impl UpdateIdList {
    // Adds the update unless already present. Returns whether it was added.
    pub(crate) fn insert(&mut self, update_id: UpdateId) -> bool {
        self.0
            .get_or_insert_with(|id| id.cmp(&update_id), || update_id)
            .1
    }

    // Removes the update. Returns whether it was present.
    pub(crate) fn remove(&mut self, update_id: UpdateId) -> bool {
        self.0.remove(|id| id.cmp(&update_id)).is_some()
    }

    pub fn contains(&self, update_id: UpdateId) -> bool {
        self.0.get(|id| id.cmp(&update_id)).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = UpdateId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
