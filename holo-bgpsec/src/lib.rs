//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod cache;
pub mod debug;
pub mod error;
pub mod index;
pub mod key;
pub mod packet;
pub mod server;
pub mod sorted;
pub mod update;
