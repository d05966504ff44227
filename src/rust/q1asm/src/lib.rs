// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod generator;
pub mod statements;

/// Physical slot on the central controller backplane.
pub type Slot = u8;
