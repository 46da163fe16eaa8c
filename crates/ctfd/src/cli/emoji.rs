// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use console::Emoji;

pub(crate) static ROCKET: Emoji = Emoji("🚀", "");
pub(crate) static PACKAGE: Emoji = Emoji("📦", "");
pub(crate) static SPARKLES: Emoji = Emoji("✨", "");
pub(crate) static CROSS_MARK: Emoji = Emoji("❌", "");
pub(crate) static INFORMATION: Emoji = Emoji("ℹ️", "");
pub(crate) static WARNING: Emoji = Emoji("⚠️", "");
pub(crate) static CHECK_MARK: Emoji = Emoji("✅", "");
pub(crate) static TRIANGULAR_FLAG: Emoji = Emoji("🚩", "");
pub(crate) static TROPHY: Emoji = Emoji("🏆", "");
pub(crate) static KEY: Emoji = Emoji("🔑", "");
