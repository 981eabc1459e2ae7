//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Entry points used by the validation server.
//!
//! The key-management side of the server hands keys over as
//! (SKI, algorithm, ASN), while the cache is keyed by (ASN, algorithm, SKI).
//! These wrappers keep both call shapes at the boundary.

use crate::cache::{RegResult, SkiCache};
use crate::key::{AlgoId, Ski};
use crate::update::UpdateId;

pub fn register_key_ski(
    cache: &mut SkiCache,
    ski: &Ski,
    algo_id: AlgoId,
    asn: u32,
) {
    cache.register_key(asn, ski, algo_id)
}

pub fn unregister_key_ski(
    cache: &mut SkiCache,
    ski: &Ski,
    algo_id: AlgoId,
    asn: u32,
) {
    cache.unregister_key(asn, ski, algo_id)
}

pub fn register_update_ski(
    cache: &mut SkiCache,
    update_id: UpdateId,
    bgpsec: &[u8],
) -> RegResult {
    cache.register_update(update_id, bgpsec)
}

pub fn unregister_update_ski(cache: &mut SkiCache, update_id: UpdateId) {
    cache.unregister_update(update_id)
}
