//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use arbitrary::Arbitrary;
use derive_new::new;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::packet::consts::SKI_LENGTH;
use crate::update::{UpdateId, UpdateIdList};

// BGPsec algorithm suite identifier.
pub type AlgoId = u8;

// Subject Key Identifier.
//
// Ordering is the lexicographic ordering of the raw bytes.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Arbitrary, DeserializeFromStr, SerializeDisplay)]
pub struct Ski(pub [u8; SKI_LENGTH]);

// Identity of a router key: the (ASN, algorithm, SKI) triple.
//
// The derived ordering matches the traversal order of the cache index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(new)]
#[derive(Arbitrary, Deserialize, Serialize)]
pub struct KeyId {
    pub asn: u32,
    pub algo_id: AlgoId,
    pub ski: Ski,
}

// Cache entry of a single key triple.
#[derive(Debug)]
pub struct KeyRecord {
    pub(crate) ski: Ski,
    // Number of registrations not yet matched by an unregistration.
    pub(crate) counter: u8,
    // Pending updates depending on this key.
    pub(crate) updates: UpdateIdList,
}

// ===== impl Ski =====

impl Ski {
    pub fn as_bytes(&self) -> &[u8; SKI_LENGTH] {
        &self.0
    }
}

impl From<[u8; SKI_LENGTH]> for Ski {
    fn from(bytes: [u8; SKI_LENGTH]) -> Ski {
        Ski(bytes)
    }
}

impl FromStr for Ski {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Ski, hex::FromHexError> {
        let mut bytes = [0; SKI_LENGTH];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Ski(bytes))
    }
}

impl std::fmt::Display for Ski {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl std::fmt::Debug for Ski {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ski({self})")
    }
}

// ===== impl KeyId =====

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AS{} algo {} SKI {}", self.asn, self.algo_id, self.ski)
    }
}

// ===== impl KeyRecord =====

impl KeyRecord {
    pub(crate) fn new(ski: Ski) -> KeyRecord {
        KeyRecord {
            ski,
            counter: 0,
            updates: Default::default(),
        }
    }

    pub fn ski(&self) -> &Ski {
        &self.ski
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    // Returns whether at least one key matching this triple is loaded.
    pub fn is_available(&self) -> bool {
        self.counter > 0
    }

    pub fn updates(&self) -> &UpdateIdList {
        &self.updates
    }

    pub fn has_update(&self, update_id: UpdateId) -> bool {
        self.updates.contains(update_id)
    }

    // Records with no registered key and no dependent update can only be
    // reclaimed by a clean pass.
    pub(crate) fn is_unused(&self) -> bool {
        self.counter == 0 && self.updates.is_empty()
    }
}
