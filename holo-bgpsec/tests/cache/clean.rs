//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use holo_bgpsec::cache::Config;
use holo_bgpsec::index::CleanStats;
use holo_bgpsec::key::KeyId;
use holo_bgpsec::update::UpdateId;

use super::{bgpsec_attr, new_cache, ski, test_key};

#[test]
fn test_clean_empty() {
    let (mut cache, _rx) = new_cache(Config::default());

    assert_eq!(cache.clean(), CleanStats::default());
    assert_eq!(cache.stats(), Default::default());
}

#[test]
fn test_clean_unused_keys() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn, ski, algo_id) = test_key(0);

    cache.register_key(asn, &ski, algo_id);
    cache.unregister_key(asn, &ski, algo_id);

    let stats = cache.clean();
    assert_eq!(
        stats,
        CleanStats {
            keys: 1,
            algorithms: 1,
            asns: 1,
            asn_nodes: 1,
        }
    );
    assert!(cache.key(&KeyId::new(asn, algo_id, ski)).is_none());
    assert_eq!(cache.stats(), Default::default());

    // Nothing left to reclaim.
    assert_eq!(cache.clean(), CleanStats::default());
}

#[test]
fn test_clean_keeps_live_keys() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn1, ski1, algo_id1) = test_key(0);
    let (asn2, ski2, algo_id2) = test_key(1);
    let (asn3, ski3, algo_id3) = test_key(2);

    // Registered key.
    cache.register_key(asn1, &ski1, algo_id1);
    // Unregistered key with a dependent update.
    let attr = bgpsec_attr(&[asn2], &[(algo_id2, &[ski2])]);
    cache.register_update(UpdateId(1), &attr);
    // Unused key.
    cache.register_key(asn3, &ski3, algo_id3);
    cache.unregister_key(asn3, &ski3, algo_id3);

    let stats = cache.clean();
    assert_eq!(stats.keys, 1);
    assert_eq!(stats.asn_nodes, 0);
    assert!(cache.key(&KeyId::new(asn1, algo_id1, ski1)).is_some());
    assert!(cache.key(&KeyId::new(asn2, algo_id2, ski2)).is_some());
    assert!(cache.key(&KeyId::new(asn3, algo_id3, ski3)).is_none());

    // Once the update is gone its keys can be reclaimed.
    cache.unregister_update(UpdateId(1));
    let stats = cache.clean();
    assert_eq!(stats.keys, 1);
    assert!(cache.key(&KeyId::new(asn2, algo_id2, ski2)).is_none());
    assert_eq!(cache.stats().keys, 1);
}

#[test]
fn test_clean_shared_algorithm() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn, ski1, algo_id) = test_key(0);
    let ski2 = ski("AB4D910F55CAE71A215EF3CAFE3ACC45B5EEC155");

    cache.register_key(asn, &ski1, algo_id);
    cache.register_key(asn, &ski2, algo_id);
    cache.unregister_key(asn, &ski1, algo_id);

    // The algorithm still holds a live key.
    let stats = cache.clean();
    assert_eq!(
        stats,
        CleanStats {
            keys: 1,
            ..Default::default()
        }
    );
    assert_eq!(cache.stats().algorithms, 1);
}

#[test]
fn test_clean_step() {
    let config = Config {
        clean_batch_size: 2,
        ..Default::default()
    };
    let (mut cache, _rx) = new_cache(config);
    let (_, ski, algo_id) = test_key(0);

    for asn in 100..105 {
        cache.register_key(asn, &ski, algo_id);
        cache.unregister_key(asn, &ski, algo_id);
    }

    let progress = cache.clean_step();
    assert!(!progress.done);
    assert_eq!(progress.stats.asns, 2);
    assert_eq!(cache.stats().asns, 3);

    let progress = cache.clean_step();
    assert!(!progress.done);
    assert_eq!(progress.stats.asns, 2);

    let progress = cache.clean_step();
    assert!(progress.done);
    assert_eq!(
        progress.stats,
        CleanStats {
            keys: 1,
            algorithms: 1,
            asns: 1,
            asn_nodes: 1,
        }
    );
    assert_eq!(cache.stats(), Default::default());
}

#[test]
fn test_clean_step_across_nodes() {
    let config = Config {
        clean_batch_size: 1,
        ..Default::default()
    };
    let (mut cache, _rx) = new_cache(config);
    let (_, ski, algo_id) = test_key(0);

    for asn in [65535, 65536, 4_200_000_000] {
        cache.register_key(asn, &ski, algo_id);
        cache.unregister_key(asn, &ski, algo_id);
    }

    let mut steps = 0;
    let mut total = CleanStats::default();
    loop {
        let progress = cache.clean_step();
        steps += 1;
        total.keys += progress.stats.keys;
        total.asns += progress.stats.asns;
        total.asn_nodes += progress.stats.asn_nodes;
        if progress.done {
            break;
        }
    }

    assert_eq!(steps, 3);
    assert_eq!(total.keys, 3);
    assert_eq!(total.asns, 3);
    assert_eq!(total.asn_nodes, 3);
    assert_eq!(cache.stats().asn_nodes, 0);

    // The next step starts a new pass.
    assert!(cache.clean_step().done);
}

#[test]
fn test_clean_preserves_order() {
    let (mut cache, _rx) = new_cache(Config::default());

    for idx in 0..12 {
        let (asn, ski, algo_id) = test_key(idx);
        cache.register_key(asn, &ski, algo_id);
        if idx % 3 == 0 {
            cache.unregister_key(asn, &ski, algo_id);
        }
    }
    cache.clean();

    let keys = cache.keys().map(|(key, _)| key).collect::<Vec<_>>();
    assert_eq!(keys.len(), 8);
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
}
