// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the gateway and its external collaborators.

pub mod provider;

pub use provider::{CompletionProvider, DeltaStream};
