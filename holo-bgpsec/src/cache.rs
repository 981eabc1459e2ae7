//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use crossbeam_channel::Sender;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::debug::Debug;
use crate::error::Error;
use crate::index::{AsnIndex, CleanCursor, CleanStats};
use crate::key::{AlgoId, KeyId, KeyRecord, Ski};
use crate::packet::bgpsec::BgpsecPath;
use crate::update::UpdateId;

// Cache of the router keys known to a BGPsec validation server.
//
// Keys are indexed by their (ASN, algorithm, SKI) triple. Each key record
// counts how many times the key was registered and tracks the pending
// updates whose validation depends on it, so that the registered handler
// can be told which updates to re-validate when the key appears or goes
// away.
pub struct SkiCache {
    config: Config,
    index: AsnIndex,
    // Keys each registered update depends on.
    update_keys: HashMap<UpdateId, BTreeSet<KeyId>>,
    clean_cursor: CleanCursor,
    handler: Box<dyn KeyChangeHandler>,
}

// SKI cache configuration.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // Send ADD and DEL notifications (key rollover).
    pub notify_key_rollover: bool,
    // Number of occupied ASN slots visited by an incremental clean step.
    pub clean_batch_size: usize,
}

// Kind of change a key went through.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum SkiStatus {
    // The key became available.
    New,
    // The key was registered again.
    Add,
    // The key was unregistered but is still available.
    Del,
    // The key is no longer available.
    Removed,
}

// Result of an update registration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum RegResult {
    // The attribute couldn't be decoded.
    Error,
    // Every Signature_Block misses at least one key: path validation is
    // bound to fail.
    Invalid,
    // At least one Signature_Block has all its keys: a full path validation
    // is required.
    Unknown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct KeyChange {
    pub status: SkiStatus,
    pub update_id: UpdateId,
}

// Receiver of key change notifications.
//
// Notifications are delivered synchronously, one per affected update,
// before the operation that triggered them returns.
pub trait KeyChangeHandler: Send {
    fn key_change(&mut self, status: SkiStatus, update_id: UpdateId);
}

// Forwards key change notifications to a channel.
#[derive(Clone, Debug)]
#[derive(new)]
pub struct ChannelNotifier {
    tx: Sender<KeyChange>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct CacheStats {
    pub asn_nodes: usize,
    pub asns: usize,
    pub algorithms: usize,
    pub keys: usize,
    pub available_keys: usize,
    pub updates: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct CleanProgress {
    pub stats: CleanStats,
    // Whether the pass reached the end of the index.
    pub done: bool,
}

// SKI cache shared between threads.
//
// All operations, lookups included, are serialized by a single lock. Key
// change notifications are delivered while the lock is held, so handlers
// must not call back into the cache.
#[derive(Clone)]
pub struct SharedSkiCache(Arc<Mutex<SkiCache>>);

// ===== impl SkiCache =====

impl SkiCache {
    pub fn new(
        config: Config,
        handler: impl KeyChangeHandler + 'static,
    ) -> SkiCache {
        Debug::CacheCreate.log();

        SkiCache {
            config,
            index: Default::default(),
            update_keys: Default::default(),
            clean_cursor: Default::default(),
            handler: Box::new(handler),
        }
    }

    // Releases the cache and everything it holds.
    pub fn release(self) {
        Debug::CacheRelease(&self.stats()).log();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Registers one instance of the given key.
    //
    // Updates waiting on the key are notified with `New` if the key just
    // became available, or with `Add` otherwise.
    pub fn register_key(&mut self, asn: u32, ski: &Ski, algo_id: AlgoId) {
        let key = KeyId::new(asn, algo_id, *ski);
        let (record, _) = self.index.get_or_create(&key);

        let Some(counter) = record.counter.checked_add(1) else {
            Error::KeyCounterOverflow(key).log();
            return;
        };
        record.counter = counter;
        Debug::KeyRegister(&key, counter).log();

        let status = if counter == 1 {
            SkiStatus::New
        } else {
            SkiStatus::Add
        };
        notify(&self.config, self.handler.as_mut(), status, record);
    }

    // Unregisters one instance of the given key.
    //
    // Updates depending on the key are notified with `Removed` if the key is
    // no longer available, or with `Del` otherwise. Unknown keys are
    // ignored. The key record itself is only reclaimed by `clean`.
    pub fn unregister_key(&mut self, asn: u32, ski: &Ski, algo_id: AlgoId) {
        let key = KeyId::new(asn, algo_id, *ski);
        let Some(record) = self
            .index
            .get_mut(&key)
            .filter(|record| record.is_available())
        else {
            Debug::KeyUnknown(&key).log();
            return;
        };

        record.counter -= 1;
        Debug::KeyUnregister(&key, record.counter).log();

        let status = if record.counter == 0 {
            SkiStatus::Removed
        } else {
            SkiStatus::Del
        };
        notify(&self.config, self.handler.as_mut(), status, record);
    }

    // Registers an update given its raw BGPsec_PATH attribute, header
    // included.
    //
    // Nothing is registered if the attribute fails to decode.
    pub fn register_update(
        &mut self,
        update_id: UpdateId,
        attr: &[u8],
    ) -> RegResult {
        let mut buf = Bytes::copy_from_slice(attr);
        match BgpsecPath::decode(&mut buf) {
            Ok(path) => self.register_update_path(update_id, &path),
            Err(error) => {
                Error::AttrDecodeError(update_id, error).log();
                Debug::UpdateRegister(update_id, RegResult::Error, 0).log();
                RegResult::Error
            }
        }
    }

    // Registers an update given its decoded BGPsec_PATH attribute.
    //
    // The update is attached to the record of every key required by any of
    // its Signature_Blocks, creating the records of keys not yet known.
    // Nothing is registered if the path is structurally invalid.
    pub fn register_update_path(
        &mut self,
        update_id: UpdateId,
        path: &BgpsecPath,
    ) -> RegResult {
        if let Err(error) = path.validate() {
            Error::AttrDecodeError(update_id, error.into()).log();
            Debug::UpdateRegister(update_id, RegResult::Error, 0).log();
            return RegResult::Error;
        }

        let mut blocks_ready = vec![true; path.sig_blocks.len()];
        let mut keys = BTreeSet::new();

        for (block_idx, key) in path.key_ids() {
            let (record, _) = self.index.get_or_create(&key);
            if !record.is_available() {
                blocks_ready[block_idx] = false;
            }
            record.updates.insert(update_id);
            keys.insert(key);
        }

        let result = if blocks_ready.iter().any(|ready| *ready) {
            RegResult::Unknown
        } else {
            RegResult::Invalid
        };
        Debug::UpdateRegister(update_id, result, keys.len()).log();

        if !keys.is_empty() {
            self.update_keys.entry(update_id).or_default().extend(keys);
        }

        result
    }

    // Detaches the update from every key record it was attached to. Unknown
    // updates are ignored.
    pub fn unregister_update(&mut self, update_id: UpdateId) {
        let Some(keys) = self.update_keys.remove(&update_id) else {
            Debug::UpdateUnknown(update_id).log();
            return;
        };

        for key in &keys {
            if let Some(record) = self.index.get_mut(key) {
                record.updates.remove(update_id);
            }
        }
        Debug::UpdateUnregister(update_id, keys.len()).log();
    }

    // Runs a full clean pass, reclaiming every key record that has no
    // registered key and no dependent update, along with the index entries
    // left empty.
    //
    // This walks the whole index. Use `clean_step` to spread the work over
    // several calls.
    pub fn clean(&mut self) -> CleanStats {
        self.clean_cursor = CleanCursor::default();
        let (stats, done) = self.index.clean(&mut self.clean_cursor, None);
        Debug::CleanPass(&stats, done).log();
        stats
    }

    // Runs a bounded part of a clean pass, resuming where the previous step
    // stopped.
    pub fn clean_step(&mut self) -> CleanProgress {
        let budget = self.config.clean_batch_size.max(1);
        let (stats, done) =
            self.index.clean(&mut self.clean_cursor, Some(budget));
        Debug::CleanPass(&stats, done).log();
        CleanProgress { stats, done }
    }

    pub fn key(&self, key: &KeyId) -> Option<&KeyRecord> {
        self.index.get(key)
    }

    // Returns all key records, sorted by ASN, algorithm and SKI.
    pub fn keys(&self) -> impl Iterator<Item = (KeyId, &KeyRecord)> {
        self.index.iter()
    }

    pub fn is_update_registered(&self, update_id: UpdateId) -> bool {
        self.update_keys.contains_key(&update_id)
    }

    // Returns the keys the given update depends on.
    pub fn update_keys(
        &self,
        update_id: UpdateId,
    ) -> impl Iterator<Item = KeyId> + '_ {
        self.update_keys
            .get(&update_id)
            .into_iter()
            .flatten()
            .copied()
    }

    pub fn stats(&self) -> CacheStats {
        let (keys, available_keys) =
            self.index.iter().fold((0, 0), |(keys, available), (_, record)| {
                (keys + 1, available + record.is_available() as usize)
            });

        CacheStats {
            asn_nodes: self.index.node_count(),
            asns: self.index.asn_count(),
            algorithms: self.index.algorithm_count(),
            keys,
            available_keys,
            updates: self.update_keys.len(),
        }
    }
}

// ===== impl Config =====

impl Default for Config {
    fn default() -> Config {
        Config {
            notify_key_rollover: true,
            clean_batch_size: 4096,
        }
    }
}

// ===== impl KeyChangeHandler =====

impl<F> KeyChangeHandler for F
where
    F: FnMut(SkiStatus, UpdateId) + Send,
{
    fn key_change(&mut self, status: SkiStatus, update_id: UpdateId) {
        self(status, update_id)
    }
}

// ===== impl ChannelNotifier =====

impl KeyChangeHandler for ChannelNotifier {
    fn key_change(&mut self, status: SkiStatus, update_id: UpdateId) {
        // A closed channel means nobody is interested anymore.
        let _ = self.tx.send(KeyChange::new(status, update_id));
    }
}

// ===== impl SharedSkiCache =====

impl SharedSkiCache {
    pub fn new(cache: SkiCache) -> SharedSkiCache {
        SharedSkiCache(Arc::new(Mutex::new(cache)))
    }

    pub fn register_key(&self, asn: u32, ski: &Ski, algo_id: AlgoId) {
        self.lock().register_key(asn, ski, algo_id)
    }

    pub fn unregister_key(&self, asn: u32, ski: &Ski, algo_id: AlgoId) {
        self.lock().unregister_key(asn, ski, algo_id)
    }

    pub fn register_update(
        &self,
        update_id: UpdateId,
        attr: &[u8],
    ) -> RegResult {
        self.lock().register_update(update_id, attr)
    }

    pub fn unregister_update(&self, update_id: UpdateId) {
        self.lock().unregister_update(update_id)
    }

    pub fn clean(&self) -> CleanStats {
        self.lock().clean()
    }

    pub fn clean_step(&self) -> CleanProgress {
        self.lock().clean_step()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    // Locks the cache for a sequence of operations.
    //
    // A panic in a key change handler poisons the lock; the cache itself
    // is left consistent, so the poison is ignored.
    pub fn lock(&self) -> MutexGuard<'_, SkiCache> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ===== helper functions =====

fn notify(
    config: &Config,
    handler: &mut dyn KeyChangeHandler,
    status: SkiStatus,
    record: &KeyRecord,
) {
    if !config.notify_key_rollover
        && matches!(status, SkiStatus::Add | SkiStatus::Del)
    {
        return;
    }

    for update_id in record.updates.iter() {
        Debug::KeyChangeNotify(status, update_id).log();
        handler.key_change(status, update_id);
    }
}
