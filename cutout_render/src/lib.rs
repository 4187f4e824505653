// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surfaces for painting a [`cutout_core`] scene without a platform canvas.
//!
//! - [`RenderPlan`]: records every paste of a frame as a [`PasteItem`], in
//!   paint order
//! - [`Raster`]: software RGBA8 target that pastes [`Image`] regions through
//!   the current affine transform

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod plan;
mod raster;

pub use plan::{PasteItem, RenderPlan};
pub use raster::{Image, Raster};
