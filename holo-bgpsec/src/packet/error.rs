//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::TryGetError;
use serde::{Deserialize, Serialize};

// BGPsec_PATH attribute decoding errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    ReadOutOfBounds,
    NotBgpsecAttribute(u8),
    MalformedAttribute(AttrError),
}

// Malformed BGPsec_PATH attribute errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AttrError {
    ReadOutOfBounds,
    AttrLength(u16),
    SecurePathLength(u16),
    SignatureBlockLength(u16),
    SignatureLength(u16),
    SignatureBlockCount(usize),
    SignatureSegmentCount(usize),
    TrailingData(usize),
}

// ===== impl DecodeError =====

impl DecodeError {
    // Returns whether the attribute was recognized as BGPsec_PATH but failed
    // to parse.
    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeError::MalformedAttribute(_))
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            DecodeError::NotBgpsecAttribute(attr_type) => {
                write!(f, "not a BGPsec_PATH attribute (type {attr_type})")
            }
            DecodeError::MalformedAttribute(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::MalformedAttribute(error) => Some(error),
            _ => None,
        }
    }
}

impl From<TryGetError> for DecodeError {
    fn from(_error: TryGetError) -> DecodeError {
        DecodeError::ReadOutOfBounds
    }
}

impl From<AttrError> for DecodeError {
    fn from(error: AttrError) -> DecodeError {
        DecodeError::MalformedAttribute(error)
    }
}

// ===== impl AttrError =====

impl std::fmt::Display for AttrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed BGPsec_PATH attribute: ")?;

        match self {
            AttrError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            AttrError::AttrLength(len) => {
                write!(f, "invalid attribute length: {len}")
            }
            AttrError::SecurePathLength(len) => {
                write!(f, "invalid Secure_Path length: {len}")
            }
            AttrError::SignatureBlockLength(len) => {
                write!(f, "invalid Signature_Block length: {len}")
            }
            AttrError::SignatureLength(len) => {
                write!(f, "invalid signature length: {len}")
            }
            AttrError::SignatureBlockCount(count) => {
                write!(f, "invalid number of Signature_Blocks: {count}")
            }
            AttrError::SignatureSegmentCount(count) => {
                write!(f, "invalid number of Signature Segments: {count}")
            }
            AttrError::TrailingData(len) => {
                write!(f, "{len} trailing bytes after the last Signature_Block")
            }
        }
    }
}

impl std::error::Error for AttrError {}

impl From<TryGetError> for AttrError {
    fn from(_error: TryGetError) -> AttrError {
        AttrError::ReadOutOfBounds
    }
}
