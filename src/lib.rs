/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

pub mod engine;
pub mod error;

/// Prelude module to import everything needed to drive a streaming pass.
pub mod prelude {
    pub use crate::engine::bitmap::Bitmap;
    pub use crate::engine::edge::{Edge, EdgeType};
    pub use crate::engine::{Engine, UpdateMode, VectorDescriptor};
    pub use crate::error::{GridError, Result};
}
