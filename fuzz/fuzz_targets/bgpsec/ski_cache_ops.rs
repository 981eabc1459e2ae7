#![no_main]

use arbitrary::Arbitrary;
use holo_bgpsec::cache::{Config, SkiCache, SkiStatus};
use holo_bgpsec::key::KeyId;
use holo_bgpsec::update::UpdateId;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    RegisterKey(KeyId),
    UnregisterKey(KeyId),
    RegisterUpdate(UpdateId, Vec<u8>),
    UnregisterUpdate(UpdateId),
    Clean,
    CleanStep,
}

fuzz_target!(|input: (bool, u8, Vec<Op>)| {
    let (notify_key_rollover, clean_batch_size, ops) = input;
    let config = Config {
        notify_key_rollover,
        clean_batch_size: clean_batch_size.into(),
    };
    let mut cache = SkiCache::new(config, |_: SkiStatus, _: UpdateId| {});

    for op in ops {
        match op {
            Op::RegisterKey(key) => {
                cache.register_key(key.asn, &key.ski, key.algo_id)
            }
            Op::UnregisterKey(key) => {
                cache.unregister_key(key.asn, &key.ski, key.algo_id)
            }
            Op::RegisterUpdate(update_id, attr) => {
                let _ = cache.register_update(update_id, &attr);
            }
            Op::UnregisterUpdate(update_id) => {
                cache.unregister_update(update_id)
            }
            Op::Clean => {
                let _ = cache.clean();
            }
            Op::CleanStep => {
                let _ = cache.clean_step();
            }
        }
    }

    // The index is walked in (ASN, algorithm, SKI) order.
    let keys = cache.keys().map(|(key, _)| key).collect::<Vec<KeyId>>();
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));

    // Every update tracked by a key record is registered.
    for (key, record) in cache.keys() {
        for update_id in record.updates().iter() {
            assert!(cache.update_keys(update_id).any(|k| k == key));
        }
    }

    // A full clean pass leaves only live records.
    cache.clean();
    assert!(cache.keys().all(|(_, record)| {
        record.is_available() || !record.updates().is_empty()
    }));
});
