// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

pub mod assets;
pub mod client;
pub mod config;
pub mod error;
pub mod flags;
pub mod instance;
pub mod models;
pub mod session;
pub mod store;
pub mod sync;
pub mod template;
