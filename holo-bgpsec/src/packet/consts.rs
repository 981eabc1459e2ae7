//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

// Length of a Subject Key Identifier.
pub const SKI_LENGTH: usize = 20;

// Maximum number of Signature_Blocks in a BGPsec_PATH attribute (RFC 8205
// allows at most two, to support algorithm transitions).
pub const MAX_SIGNATURE_BLOCKS: usize = 2;

// BGP Path Attribute Flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct AttrFlags: u8 {
        const OPTIONAL = 0x80;
        const TRANSITIVE = 0x40;
        const PARTIAL = 0x20;
        const EXTENDED = 0x10;
    }
}

// Secure_Path Segment Flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash)]
    #[derive(Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct SegmentFlags: u8 {
        const CONFED_SEGMENT = 0x80;
    }
}

// BGP Path Attribute Types handled by this crate.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-2
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum AttrType {
    // RFC 8205
    BgpsecPath = 33,
}
