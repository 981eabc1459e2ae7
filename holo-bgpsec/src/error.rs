//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{warn, warn_span};

use crate::key::KeyId;
use crate::packet::error::DecodeError;
use crate::update::UpdateId;

// SKI cache errors.
#[derive(Debug)]
pub enum Error {
    // Update registration
    AttrDecodeError(UpdateId, DecodeError),
    // Key registration
    KeyCounterOverflow(KeyId),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::AttrDecodeError(update_id, error) => {
                warn_span!("update", %update_id).in_scope(|| {
                    warn!(error = %with_source(error), "{}", self);
                });
            }
            Error::KeyCounterOverflow(key) => {
                warn_span!(
                    "key",
                    asn = %key.asn,
                    algo_id = %key.algo_id,
                    ski = %key.ski
                )
                .in_scope(|| {
                    warn!("{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AttrDecodeError(..) => {
                write!(f, "failed to decode BGPsec_PATH attribute")
            }
            Error::KeyCounterOverflow(..) => {
                write!(f, "key registration counter overflow")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::AttrDecodeError(_, error) => Some(error),
            _ => None,
        }
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
