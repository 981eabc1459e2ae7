//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use holo_bgpsec::cache::{Config, KeyChange, RegResult, SkiStatus};
use holo_bgpsec::key::KeyId;
use holo_bgpsec::packet::bgpsec::{
    BgpsecPath, SecurePathSegment, SignatureBlock, SignatureSegment,
};
use holo_bgpsec::update::UpdateId;

use super::{bgpsec_attr, new_cache, notifications, test_key};

// One segment for ASN 65534, one Signature_Block for algorithm 1 signed with
// SKI AB4D910F55CAE71A215EF3CAFE3ACC45B5EEC154.
const ATTR1: [u8; 41] = [
    0x90, 0x21, 0x00, 0x25, 0x00, 0x08, 0x00, 0x01, 0x00, 0x00, 0xff, 0xfe,
    0x01, 0x00, 0x1d, 0xab, 0x4d, 0x91, 0x0f, 0x55, 0xca, 0xe7, 0x1a, 0x21,
    0x5e, 0xf3, 0xca, 0xfe, 0x3a, 0xcc, 0x45, 0xb5, 0xee, 0xc1, 0x54, 0x00,
    0x04, 0xde, 0xad, 0xbe, 0xef,
];

#[test]
fn test_register_update_key_lifecycle() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn, ski, algo_id) = test_key(0);
    let update_id = UpdateId(0x0001_0001);

    cache.register_key(asn, &ski, algo_id);
    assert_eq!(cache.register_update(update_id, &ATTR1), RegResult::Unknown);

    cache.unregister_key(asn, &ski, algo_id);
    assert_eq!(cache.register_update(update_id, &ATTR1), RegResult::Invalid);
}

#[test]
fn test_register_update_unknown_key() {
    let (mut cache, rx) = new_cache(Config::default());
    let (asn, ski, algo_id) = test_key(0);
    let update_id = UpdateId(1);

    assert_eq!(cache.register_update(update_id, &ATTR1), RegResult::Invalid);

    // The missing key now has a record tracking the update.
    let record = cache.key(&KeyId::new(asn, algo_id, ski)).unwrap();
    assert_eq!(record.counter(), 0);
    assert!(record.has_update(update_id));
    assert!(cache.is_update_registered(update_id));

    cache.register_key(asn, &ski, algo_id);
    assert_eq!(
        notifications(&rx),
        [KeyChange::new(SkiStatus::New, update_id)]
    );
}

#[test]
fn test_register_update_path_keys() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn1, ski1, _) = test_key(0);
    let (asn2, ski2, _) = test_key(4);
    let update_id = UpdateId(2);

    // Each signature segment pairs with the Secure_Path segment at the same
    // position.
    let attr = bgpsec_attr(&[asn1, asn2], &[(1, &[ski1, ski2])]);
    cache.register_update(update_id, &attr);

    let keys = cache.update_keys(update_id).collect::<Vec<_>>();
    assert_eq!(
        keys,
        [KeyId::new(asn1, 1, ski1), KeyId::new(asn2, 1, ski2)]
    );
    assert_eq!(cache.stats().updates, 1);
}

#[test]
fn test_register_update_two_blocks() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn1, ski1, _) = test_key(0);
    let (asn2, ski2, _) = test_key(4);
    let (_, ski3, _) = test_key(2);
    let (_, ski4, _) = test_key(6);
    let attr = bgpsec_attr(
        &[asn1, asn2],
        &[(1, &[ski1, ski2]), (2, &[ski3, ski4])],
    );

    // No block has all of its keys.
    assert_eq!(cache.register_update(UpdateId(1), &attr), RegResult::Invalid);

    // Only one key of each block.
    cache.register_key(asn1, &ski1, 1);
    cache.register_key(asn2, &ski4, 2);
    assert_eq!(cache.register_update(UpdateId(2), &attr), RegResult::Invalid);

    // One complete block is enough.
    cache.register_key(asn1, &ski3, 2);
    assert_eq!(cache.register_update(UpdateId(3), &attr), RegResult::Unknown);

    // Both blocks complete.
    cache.register_key(asn2, &ski2, 1);
    assert_eq!(cache.register_update(UpdateId(4), &attr), RegResult::Unknown);

    assert_eq!(cache.stats().keys, 4);
    assert_eq!(cache.stats().updates, 4);
}

#[test]
fn test_register_update_no_signature_blocks() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn, _, _) = test_key(0);
    let attr = bgpsec_attr(&[asn], &[]);

    assert_eq!(cache.register_update(UpdateId(1), &attr), RegResult::Invalid);
    assert_eq!(cache.stats().keys, 0);
    assert!(!cache.is_update_registered(UpdateId(1)));
}

#[test]
fn test_register_update_malformed() {
    let (mut cache, rx) = new_cache(Config::default());

    // Truncated attribute.
    assert_eq!(
        cache.register_update(UpdateId(1), &ATTR1[..30]),
        RegResult::Error
    );

    // Secure_Path length not a multiple of the segment length.
    let mut attr = ATTR1;
    attr[5] = 0x09;
    assert_eq!(cache.register_update(UpdateId(2), &attr), RegResult::Error);

    // Secure_Path length past the end of the attribute.
    let mut attr = ATTR1;
    attr[5] = 0x2c;
    assert_eq!(cache.register_update(UpdateId(5), &attr), RegResult::Error);

    // Not a BGPsec_PATH attribute.
    let mut attr = ATTR1;
    attr[1] = 0x02;
    assert_eq!(cache.register_update(UpdateId(3), &attr), RegResult::Error);

    // Empty buffer.
    assert_eq!(cache.register_update(UpdateId(4), &[]), RegResult::Error);

    // Nothing was registered.
    assert_eq!(cache.stats().keys, 0);
    assert!(!cache.is_update_registered(UpdateId(5)));
    assert_eq!(cache.stats().updates, 0);
    assert!(notifications(&rx).is_empty());
}

#[test]
fn test_register_update_twice() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn, ski, algo_id) = test_key(0);
    let update_id = UpdateId(5);

    cache.register_update(update_id, &ATTR1);
    cache.register_update(update_id, &ATTR1);

    let record = cache.key(&KeyId::new(asn, algo_id, ski)).unwrap();
    assert_eq!(record.updates().len(), 1);

    // A single unregistration detaches the update.
    cache.unregister_update(update_id);
    let record = cache.key(&KeyId::new(asn, algo_id, ski)).unwrap();
    assert!(record.updates().is_empty());
}

#[test]
fn test_unregister_update() {
    let (mut cache, rx) = new_cache(Config::default());
    let (asn1, ski1, algo_id) = test_key(0);
    let (asn2, ski2, _) = test_key(4);
    let attr = bgpsec_attr(&[asn1, asn2], &[(algo_id, &[ski1, ski2])]);

    cache.register_update(UpdateId(1), &attr);
    cache.register_update(UpdateId(2), &ATTR1);
    cache.unregister_update(UpdateId(1));

    assert!(!cache.is_update_registered(UpdateId(1)));
    assert_eq!(cache.update_keys(UpdateId(1)).count(), 0);
    assert!(cache.keys().all(|(_, record)| !record.has_update(UpdateId(1))));

    // Other updates are untouched.
    let record = cache.key(&KeyId::new(asn1, algo_id, ski1)).unwrap();
    assert!(record.has_update(UpdateId(2)));

    // Only the remaining update is notified.
    cache.register_key(asn1, &ski1, algo_id);
    cache.register_key(asn2, &ski2, algo_id);
    assert_eq!(
        notifications(&rx),
        [KeyChange::new(SkiStatus::New, UpdateId(2))]
    );
}

#[test]
fn test_unregister_unknown_update() {
    let (mut cache, _rx) = new_cache(Config::default());

    cache.register_update(UpdateId(1), &ATTR1);
    cache.unregister_update(UpdateId(2));

    assert!(cache.is_update_registered(UpdateId(1)));
    assert_eq!(cache.stats().updates, 1);
}

#[test]
fn test_register_update_path_segment_mismatch() {
    let (mut cache, rx) = new_cache(Config::default());
    let (asn, ski, algo_id) = test_key(0);
    cache.register_key(asn, &ski, algo_id);

    // Signature_Block shorter than the Secure_Path.
    let path = BgpsecPath::new(
        vec![SecurePathSegment::new(asn), SecurePathSegment::new(65535)],
        [SignatureBlock::new(
            algo_id,
            vec![SignatureSegment::new(ski, vec![0x01])],
        )],
    );
    assert_eq!(
        cache.register_update_path(UpdateId(1), &path),
        RegResult::Error
    );

    // Empty Signature_Block.
    let path = BgpsecPath::new(
        vec![SecurePathSegment::new(asn)],
        [SignatureBlock::new(7, vec![])],
    );
    assert_eq!(
        cache.register_update_path(UpdateId(2), &path),
        RegResult::Error
    );

    // Empty Secure_Path.
    let path = BgpsecPath::new(vec![], [SignatureBlock::new(7, vec![])]);
    assert_eq!(
        cache.register_update_path(UpdateId(3), &path),
        RegResult::Error
    );

    // Too many Signature_Blocks.
    let block = SignatureBlock::new(
        algo_id,
        vec![SignatureSegment::new(ski, vec![0x01])],
    );
    let path = BgpsecPath::new(
        vec![SecurePathSegment::new(asn)],
        [block.clone(), block.clone(), block],
    );
    assert_eq!(
        cache.register_update_path(UpdateId(4), &path),
        RegResult::Error
    );

    // Nothing was registered.
    assert_eq!(cache.stats().keys, 1);
    assert_eq!(cache.stats().updates, 0);
    let record = cache.key(&KeyId::new(asn, algo_id, ski)).unwrap();
    assert!(record.updates().is_empty());
    assert!(notifications(&rx).is_empty());
}

#[test]
fn test_register_update_path() {
    let (mut cache, _rx) = new_cache(Config::default());
    let (asn, ski, algo_id) = test_key(0);
    cache.register_key(asn, &ski, algo_id);

    let path = BgpsecPath::new(
        vec![SecurePathSegment::new(asn), SecurePathSegment::new(65535)],
        [SignatureBlock::new(
            algo_id,
            vec![
                SignatureSegment::new(ski, vec![0x01]),
                SignatureSegment::new(ski, vec![0x02]),
            ],
        )],
    );
    // The key of AS65535 is missing.
    assert_eq!(
        cache.register_update_path(UpdateId(1), &path),
        RegResult::Invalid
    );
    assert_eq!(cache.update_keys(UpdateId(1)).count(), 2);
}
