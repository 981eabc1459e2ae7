//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

use crate::key::{AlgoId, KeyId, KeyRecord};
use crate::sorted::SortedList;

// Number of slots in the dense array of an upper ASN node, one per possible
// value of the lower 16 bits of an ASN.
pub const ASN_SLOTS: usize = 1 << 16;

// Two-level ASN index.
//
// The first level is a sparse list of nodes sorted by the upper 16 bits of
// the ASN. Each node owns a dense array addressed by the lower 16 bits,
// whose slots hold the algorithm buckets of a single ASN. Most deployed ASNs
// fit in 16 bits, so the first level is expected to stay very short.
#[derive(Debug, Default)]
pub struct AsnIndex {
    nodes: SortedList<AsnNode>,
}

// Dense array of the ASNs sharing the same upper 16 bits.
pub struct AsnNode {
    upper: u16,
    // Number of slots in use.
    occupied: usize,
    slots: Box<[Option<Box<AlgoList>>]>,
}

// Algorithm buckets of a single ASN, sorted by algorithm identifier.
pub type AlgoList = SortedList<AlgoBucket>;

// Key records of a single (ASN, algorithm) pair, sorted by SKI.
#[derive(Debug)]
pub struct AlgoBucket {
    algo_id: AlgoId,
    keys: SortedList<KeyRecord>,
}

// Position where an interrupted clean pass resumes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CleanCursor {
    next_asn: u32,
}

// Number of elements reclaimed by a clean pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct CleanStats {
    pub keys: usize,
    pub algorithms: usize,
    pub asns: usize,
    pub asn_nodes: usize,
}

// ===== impl AsnIndex =====

impl AsnIndex {
    pub(crate) fn get(&self, key: &KeyId) -> Option<&KeyRecord> {
        let (upper, lower) = split_asn(key.asn);
        let node = self.nodes.get(|node| node.upper.cmp(&upper))?;
        let algorithms = node.slots[lower as usize].as_deref()?;
        let bucket =
            algorithms.get(|bucket| bucket.algo_id.cmp(&key.algo_id))?;
        bucket.keys.get(|record| record.ski.cmp(&key.ski))
    }

    pub(crate) fn get_mut(&mut self, key: &KeyId) -> Option<&mut KeyRecord> {
        let (upper, lower) = split_asn(key.asn);
        let node = self.nodes.get_mut(|node| node.upper.cmp(&upper))?;
        let algorithms = node.slots[lower as usize].as_deref_mut()?;
        let bucket =
            algorithms.get_mut(|bucket| bucket.algo_id.cmp(&key.algo_id))?;
        bucket.keys.get_mut(|record| record.ski.cmp(&key.ski))
    }

    // Looks up the record of the given key, creating it (and any missing
    // index level above it) if necessary. The returned flag tells whether
    // the record was created.
    pub(crate) fn get_or_create(
        &mut self,
        key: &KeyId,
    ) -> (&mut KeyRecord, bool) {
        let (upper, lower) = split_asn(key.asn);

        // Upper ASN node.
        let (node, _) = self
            .nodes
            .get_or_insert_with(|node| node.upper.cmp(&upper), || {
                AsnNode::new(upper)
            });

        // Lower ASN slot.
        let occupied = &mut node.occupied;
        let algorithms =
            node.slots[lower as usize].get_or_insert_with(|| {
                *occupied += 1;
                Box::default()
            });

        // Algorithm bucket.
        let (bucket, _) = algorithms.get_or_insert_with(
            |bucket| bucket.algo_id.cmp(&key.algo_id),
            || AlgoBucket::new(key.algo_id),
        );

        // Key record.
        bucket.keys.get_or_insert_with(
            |record| record.ski.cmp(&key.ski),
            || KeyRecord::new(key.ski),
        )
    }

    // Returns all key records in index order: ascending ASN, then ascending
    // algorithm, then ascending SKI.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (KeyId, &KeyRecord)> {
        self.nodes.iter().flat_map(|node| node.iter())
    }

    // Reclaims key records that have no registered key and no dependent
    // update, then any algorithm bucket, ASN slot and upper ASN node left
    // empty.
    //
    // When a budget is given, at most that many occupied ASN slots are
    // visited, and the cursor records where the next call resumes. Returns
    // whether the pass reached the end of the index.
    pub(crate) fn clean(
        &mut self,
        cursor: &mut CleanCursor,
        budget: Option<usize>,
    ) -> (CleanStats, bool) {
        let mut stats = CleanStats::default();
        let mut visited = 0;
        let (start_upper, start_lower) = split_asn(cursor.next_asn);

        let done = 'pass: {
            for node in self.nodes.iter_mut() {
                if node.upper < start_upper {
                    continue;
                }
                let first = if node.upper == start_upper {
                    start_lower as usize
                } else {
                    0
                };

                for lower in first..ASN_SLOTS {
                    let Some(algorithms) = node.slots[lower].as_deref_mut()
                    else {
                        continue;
                    };
                    if budget.is_some_and(|budget| visited >= budget) {
                        cursor.next_asn = join_asn(node.upper, lower as u16);
                        break 'pass false;
                    }
                    visited += 1;

                    clean_algorithms(algorithms, &mut stats);
                    if algorithms.is_empty() {
                        node.slots[lower] = None;
                        node.occupied -= 1;
                        stats.asns += 1;
                    }
                }
            }

            cursor.next_asn = 0;
            true
        };

        // Upper ASN nodes are cheap to keep around, but there's no reason
        // to hold on to a fully empty one.
        let nodes = self.nodes.len();
        self.nodes.retain(|node| node.occupied > 0);
        stats.asn_nodes = nodes - self.nodes.len();

        (stats, done)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn asn_count(&self) -> usize {
        self.nodes.iter().map(|node| node.occupied).sum()
    }

    pub(crate) fn algorithm_count(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| node.slots.iter().flatten())
            .map(|algorithms| algorithms.len())
            .sum()
    }
}

// ===== impl AsnNode =====

impl AsnNode {
    fn new(upper: u16) -> AsnNode {
        AsnNode {
            upper,
            occupied: 0,
            slots: std::iter::repeat_with(|| None).take(ASN_SLOTS).collect(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (KeyId, &KeyRecord)> {
        let upper = self.upper;
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(lower, slot)| Some((lower, slot.as_deref()?)))
            .flat_map(move |(lower, algorithms)| {
                let asn = join_asn(upper, lower as u16);
                algorithms.iter().flat_map(move |bucket| bucket.iter(asn))
            })
    }
}

impl std::fmt::Debug for AsnNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsnNode")
            .field("upper", &self.upper)
            .field("occupied", &self.occupied)
            .finish_non_exhaustive()
    }
}

// ===== impl AlgoBucket =====

impl AlgoBucket {
    fn new(algo_id: AlgoId) -> AlgoBucket {
        AlgoBucket {
            algo_id,
            keys: Default::default(),
        }
    }

    fn iter(&self, asn: u32) -> impl Iterator<Item = (KeyId, &KeyRecord)> {
        let algo_id = self.algo_id;
        self.keys
            .iter()
            .map(move |record| (KeyId::new(asn, algo_id, record.ski), record))
    }
}

// ===== helper functions =====

// Splits an ASN into its upper and lower 16 bits.
fn split_asn(asn: u32) -> (u16, u16) {
    ((asn >> 16) as u16, (asn & 0xFFFF) as u16)
}

fn join_asn(upper: u16, lower: u16) -> u32 {
    ((upper as u32) << 16) | lower as u32
}

fn clean_algorithms(algorithms: &mut AlgoList, stats: &mut CleanStats) {
    algorithms.retain(|bucket| {
        let keys = bucket.keys.len();
        bucket.keys.retain(|record| !record.is_unused());
        stats.keys += keys - bucket.keys.len();

        if bucket.keys.is_empty() {
            stats.algorithms += 1;
            false
        } else {
            true
        }
    });
}
