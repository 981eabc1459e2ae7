#![no_main]

use bytes::{Bytes, BytesMut};
use holo_bgpsec::packet::bgpsec::BgpsecPath;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buf = Bytes::copy_from_slice(data);

    // Whatever decodes must encode back to the same path. Attribute flags
    // may differ since the extended length flag is always set on encode.
    if let Ok(attr) = BgpsecPath::decode(&mut buf) {
        let mut encoded = BytesMut::new();
        attr.encode(&mut encoded);
        let mut encoded = encoded.freeze();
        let decoded = BgpsecPath::decode(&mut encoded).unwrap();
        assert_eq!(decoded.secure_path, attr.secure_path);
        assert_eq!(decoded.sig_blocks, attr.sig_blocks);
    }
});
