// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font engine implementations.

#[cfg(feature = "skrifa")]
pub mod skrifa;
