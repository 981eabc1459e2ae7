//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod bgpsec;
pub mod consts;
pub mod error;
