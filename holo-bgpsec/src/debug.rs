//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

use crate::cache::{CacheStats, RegResult, SkiStatus};
use crate::index::CleanStats;
use crate::key::KeyId;
use crate::update::UpdateId;

// SKI cache debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    CacheCreate,
    CacheRelease(&'a CacheStats),
    KeyRegister(&'a KeyId, u8),
    KeyUnregister(&'a KeyId, u8),
    KeyUnknown(&'a KeyId),
    KeyChangeNotify(SkiStatus, UpdateId),
    UpdateRegister(UpdateId, RegResult, usize),
    UpdateUnregister(UpdateId, usize),
    UpdateUnknown(UpdateId),
    CleanPass(&'a CleanStats, bool),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::CacheCreate => {
                debug!("{}", self);
            }
            Debug::CacheRelease(stats) => {
                debug!(
                    asns = %stats.asns,
                    keys = %stats.keys,
                    updates = %stats.updates,
                    "{}", self
                );
            }
            Debug::KeyRegister(key, counter)
            | Debug::KeyUnregister(key, counter) => {
                debug_span!(
                    "key",
                    asn = %key.asn,
                    algo_id = %key.algo_id,
                    ski = %key.ski
                )
                .in_scope(|| {
                    debug!(%counter, "{}", self);
                });
            }
            Debug::KeyUnknown(key) => {
                debug_span!(
                    "key",
                    asn = %key.asn,
                    algo_id = %key.algo_id,
                    ski = %key.ski
                )
                .in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::KeyChangeNotify(status, update_id) => {
                debug_span!("update", %update_id).in_scope(|| {
                    debug!(?status, "{}", self);
                });
            }
            Debug::UpdateRegister(update_id, result, keys) => {
                debug_span!("update", %update_id).in_scope(|| {
                    debug!(?result, %keys, "{}", self);
                });
            }
            Debug::UpdateUnregister(update_id, keys) => {
                debug_span!("update", %update_id).in_scope(|| {
                    debug!(%keys, "{}", self);
                });
            }
            Debug::UpdateUnknown(update_id) => {
                debug_span!("update", %update_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::CleanPass(stats, done) => {
                debug!(
                    keys = %stats.keys,
                    algorithms = %stats.algorithms,
                    asns = %stats.asns,
                    asn_nodes = %stats.asn_nodes,
                    %done,
                    "{}", self
                );
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::CacheCreate => {
                write!(f, "cache created")
            }
            Debug::CacheRelease(..) => {
                write!(f, "cache released")
            }
            Debug::KeyRegister(..) => {
                write!(f, "key registered")
            }
            Debug::KeyUnregister(..) => {
                write!(f, "key unregistered")
            }
            Debug::KeyUnknown(..) => {
                write!(f, "ignoring unregistration of unknown key")
            }
            Debug::KeyChangeNotify(..) => {
                write!(f, "key change notification")
            }
            Debug::UpdateRegister(..) => {
                write!(f, "update registered")
            }
            Debug::UpdateUnregister(..) => {
                write!(f, "update unregistered")
            }
            Debug::UpdateUnknown(..) => {
                write!(f, "ignoring unregistration of unknown update")
            }
            Debug::CleanPass(..) => {
                write!(f, "clean pass")
            }
        }
    }
}
