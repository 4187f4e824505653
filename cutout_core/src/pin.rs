// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node transform descriptor.
//!
//! A [`Pin`] holds the declarative layout inputs of one node (size, scale,
//! skew, rotation, pivot, handle, alignment, offset, alpha) and three cached
//! outputs: the relative matrix, the absolute matrix and the axis-aligned
//! bound. Each output remembers the [`VersionClock`] stamp it was computed
//! at and is only recomputed when an input stamp is newer.
//!
//! Inputs are written in batches through [`PinUpdate`]. A batch marks at
//! most two flags ("transform changed", "translate changed") and advances
//! the clock at most once per flag, however many options it carries.
//! Writing a value equal to the current one marks nothing.
//!
//! ```text
//!   inputs ► transform_ts ┬► bound
//!            translate_ts ┼► relative ► absolute ► matrix_ts
//!   parent.transform_ts ──┘               ▲
//!   parent.matrix_ts ─────────────────────┘
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use kurbo::{Affine, Point, Rect, Size};

use crate::matrix::Matrix;
use crate::stamp::{VersionClock, is_stale, newest};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How a target size is mapped onto a node's natural size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FitMode {
    /// Uniform scale, the smaller of the two axis ratios (fit inside).
    #[default]
    In,
    /// Uniform scale, the larger of the two axis ratios (cover).
    Out,
    /// Independent axis scales.
    Stretch,
}

impl FitMode {
    /// Returns the option-string spelling of this mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Stretch => "stretch",
        }
    }

    fn unify(self, sx: f64, sy: f64) -> (f64, f64) {
        match self {
            Self::In => {
                let s = sx.min(sy);
                (s, s)
            }
            Self::Out => {
                let s = sx.max(sy);
                (s, s)
            }
            Self::Stretch => (sx, sy),
        }
    }
}

impl FromStr for FitMode {
    type Err = PinParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            "stretch" => Ok(Self::Stretch),
            _ => Err(PinParseError::InvalidMode(String::from(s))),
        }
    }
}

/// One pin property write.
///
/// Combined options (`Scale`, `Skew`, `Pivot`, `Offset`, `Align`, `Handle`)
/// write the same value to both axes. `AlignX`/`AlignY` also set the
/// matching handle, so an aligned node anchors at the same fraction of
/// itself as of its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PinOption {
    /// Opacity of the node and its subtree.
    Alpha(f64),
    /// Opacity applied to this node's own draw payloads only.
    TextureAlpha(f64),
    /// Width; also becomes the natural width used by resize options.
    Width(f64),
    /// Height; also becomes the natural height used by resize options.
    Height(f64),
    /// Uniform scale.
    Scale(f64),
    /// Horizontal scale.
    ScaleX(f64),
    /// Vertical scale.
    ScaleY(f64),
    /// Shear on both axes.
    Skew(f64),
    /// Horizontal shear.
    SkewX(f64),
    /// Vertical shear.
    SkewY(f64),
    /// Rotation in radians.
    Rotation(f64),
    /// Pivot on both axes, as a fraction of the node's size.
    Pivot(f64),
    /// Horizontal pivot.
    PivotX(f64),
    /// Vertical pivot.
    PivotY(f64),
    /// Offset on both axes, in parent pixels.
    Offset(f64),
    /// Horizontal offset.
    OffsetX(f64),
    /// Vertical offset.
    OffsetY(f64),
    /// Alignment on both axes, as a fraction of the parent's size.
    Align(f64),
    /// Horizontal alignment.
    AlignX(f64),
    /// Vertical alignment.
    AlignY(f64),
    /// Handle on both axes, as a fraction of the node's bound.
    Handle(f64),
    /// Horizontal handle.
    HandleX(f64),
    /// Vertical handle.
    HandleY(f64),
    /// Fit used when both `ResizeWidth` and `ResizeHeight` are in the batch.
    ResizeMode(FitMode),
    /// Target width; sets the horizontal scale and restores natural width.
    ResizeWidth(f64),
    /// Target height; sets the vertical scale and restores natural height.
    ResizeHeight(f64),
    /// Fit used when both `ScaleWidth` and `ScaleHeight` are in the batch.
    ScaleMode(FitMode),
    /// Target width; sets the horizontal scale only.
    ScaleWidth(f64),
    /// Target height; sets the vertical scale only.
    ScaleHeight(f64),
}

impl PinOption {
    /// Returns the key this option writes.
    #[must_use]
    pub const fn key(&self) -> PinKey {
        match self {
            Self::Alpha(_) => PinKey::Alpha,
            Self::TextureAlpha(_) => PinKey::TextureAlpha,
            Self::Width(_) => PinKey::Width,
            Self::Height(_) => PinKey::Height,
            Self::Scale(_) => PinKey::Scale,
            Self::ScaleX(_) => PinKey::ScaleX,
            Self::ScaleY(_) => PinKey::ScaleY,
            Self::Skew(_) => PinKey::Skew,
            Self::SkewX(_) => PinKey::SkewX,
            Self::SkewY(_) => PinKey::SkewY,
            Self::Rotation(_) => PinKey::Rotation,
            Self::Pivot(_) => PinKey::Pivot,
            Self::PivotX(_) => PinKey::PivotX,
            Self::PivotY(_) => PinKey::PivotY,
            Self::Offset(_) => PinKey::Offset,
            Self::OffsetX(_) => PinKey::OffsetX,
            Self::OffsetY(_) => PinKey::OffsetY,
            Self::Align(_) => PinKey::Align,
            Self::AlignX(_) => PinKey::AlignX,
            Self::AlignY(_) => PinKey::AlignY,
            Self::Handle(_) => PinKey::Handle,
            Self::HandleX(_) => PinKey::HandleX,
            Self::HandleY(_) => PinKey::HandleY,
            Self::ResizeMode(_) => PinKey::ResizeMode,
            Self::ResizeWidth(_) => PinKey::ResizeWidth,
            Self::ResizeHeight(_) => PinKey::ResizeHeight,
            Self::ScaleMode(_) => PinKey::ScaleMode,
            Self::ScaleWidth(_) => PinKey::ScaleWidth,
            Self::ScaleHeight(_) => PinKey::ScaleHeight,
        }
    }

    /// Builds an option from its string key and a value.
    ///
    /// Mode keys (`resizeMode`, `scaleMode`) take a string (`in`, `out` or
    /// `stretch`); every other key takes a number.
    ///
    /// # Errors
    ///
    /// Returns [`PinParseError`] for an unknown key, a value of the wrong
    /// kind, or an unknown mode string.
    pub fn parse(key: &str, value: PinValue<'_>) -> Result<Self, PinParseError> {
        let key: PinKey = key.parse()?;
        let num = |value: PinValue<'_>| match value {
            PinValue::Num(v) => Ok(v),
            PinValue::Str(_) => Err(PinParseError::ExpectedNumber(key)),
        };
        let mode = |value: PinValue<'_>| match value {
            PinValue::Str(s) => s.parse::<FitMode>(),
            PinValue::Num(_) => Err(PinParseError::ExpectedMode(key)),
        };
        Ok(match key {
            PinKey::Alpha => Self::Alpha(num(value)?),
            PinKey::TextureAlpha => Self::TextureAlpha(num(value)?),
            PinKey::Width => Self::Width(num(value)?),
            PinKey::Height => Self::Height(num(value)?),
            PinKey::Scale => Self::Scale(num(value)?),
            PinKey::ScaleX => Self::ScaleX(num(value)?),
            PinKey::ScaleY => Self::ScaleY(num(value)?),
            PinKey::Skew => Self::Skew(num(value)?),
            PinKey::SkewX => Self::SkewX(num(value)?),
            PinKey::SkewY => Self::SkewY(num(value)?),
            PinKey::Rotation => Self::Rotation(num(value)?),
            PinKey::Pivot => Self::Pivot(num(value)?),
            PinKey::PivotX => Self::PivotX(num(value)?),
            PinKey::PivotY => Self::PivotY(num(value)?),
            PinKey::Offset => Self::Offset(num(value)?),
            PinKey::OffsetX => Self::OffsetX(num(value)?),
            PinKey::OffsetY => Self::OffsetY(num(value)?),
            PinKey::Align => Self::Align(num(value)?),
            PinKey::AlignX => Self::AlignX(num(value)?),
            PinKey::AlignY => Self::AlignY(num(value)?),
            PinKey::Handle => Self::Handle(num(value)?),
            PinKey::HandleX => Self::HandleX(num(value)?),
            PinKey::HandleY => Self::HandleY(num(value)?),
            PinKey::ResizeMode => Self::ResizeMode(mode(value)?),
            PinKey::ResizeWidth => Self::ResizeWidth(num(value)?),
            PinKey::ResizeHeight => Self::ResizeHeight(num(value)?),
            PinKey::ScaleMode => Self::ScaleMode(mode(value)?),
            PinKey::ScaleWidth => Self::ScaleWidth(num(value)?),
            PinKey::ScaleHeight => Self::ScaleHeight(num(value)?),
        })
    }

    fn is_secondary(&self) -> bool {
        matches!(
            self,
            Self::ResizeMode(_)
                | Self::ResizeWidth(_)
                | Self::ResizeHeight(_)
                | Self::ScaleMode(_)
                | Self::ScaleWidth(_)
                | Self::ScaleHeight(_)
        )
    }
}

/// Names of the recognized pin options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[expect(missing_docs, reason = "each variant is named after its option key")]
pub enum PinKey {
    Alpha,
    TextureAlpha,
    Width,
    Height,
    Scale,
    ScaleX,
    ScaleY,
    Skew,
    SkewX,
    SkewY,
    Rotation,
    Pivot,
    PivotX,
    PivotY,
    Offset,
    OffsetX,
    OffsetY,
    Align,
    AlignX,
    AlignY,
    Handle,
    HandleX,
    HandleY,
    ResizeMode,
    ResizeWidth,
    ResizeHeight,
    ScaleMode,
    ScaleWidth,
    ScaleHeight,
}

impl PinKey {
    /// Every key, in option-table order.
    pub const ALL: [Self; 29] = [
        Self::Alpha,
        Self::TextureAlpha,
        Self::Width,
        Self::Height,
        Self::Scale,
        Self::ScaleX,
        Self::ScaleY,
        Self::Skew,
        Self::SkewX,
        Self::SkewY,
        Self::Rotation,
        Self::Pivot,
        Self::PivotX,
        Self::PivotY,
        Self::Offset,
        Self::OffsetX,
        Self::OffsetY,
        Self::Align,
        Self::AlignX,
        Self::AlignY,
        Self::Handle,
        Self::HandleX,
        Self::HandleY,
        Self::ResizeMode,
        Self::ResizeWidth,
        Self::ResizeHeight,
        Self::ScaleMode,
        Self::ScaleWidth,
        Self::ScaleHeight,
    ];

    /// Returns the camel-case option name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::TextureAlpha => "textureAlpha",
            Self::Width => "width",
            Self::Height => "height",
            Self::Scale => "scale",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Skew => "skew",
            Self::SkewX => "skewX",
            Self::SkewY => "skewY",
            Self::Rotation => "rotation",
            Self::Pivot => "pivot",
            Self::PivotX => "pivotX",
            Self::PivotY => "pivotY",
            Self::Offset => "offset",
            Self::OffsetX => "offsetX",
            Self::OffsetY => "offsetY",
            Self::Align => "align",
            Self::AlignX => "alignX",
            Self::AlignY => "alignY",
            Self::Handle => "handle",
            Self::HandleX => "handleX",
            Self::HandleY => "handleY",
            Self::ResizeMode => "resizeMode",
            Self::ResizeWidth => "resizeWidth",
            Self::ResizeHeight => "resizeHeight",
            Self::ScaleMode => "scaleMode",
            Self::ScaleWidth => "scaleWidth",
            Self::ScaleHeight => "scaleHeight",
        }
    }
}

impl FromStr for PinKey {
    type Err = PinParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| PinParseError::UnknownKey(String::from(s)))
    }
}

impl fmt::Display for PinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A loosely typed option value, for the string-keyed surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PinValue<'a> {
    /// A numeric value.
    Num(f64),
    /// A string value (fit modes).
    Str(&'a str),
}

impl From<f64> for PinValue<'_> {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

impl<'a> From<&'a str> for PinValue<'a> {
    fn from(s: &'a str) -> Self {
        Self::Str(s)
    }
}

/// Error returned when a string-keyed option cannot be mapped to a
/// [`PinOption`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PinParseError {
    /// The key is not one of the recognized option names.
    #[error("invalid pin: {0}")]
    UnknownKey(String),
    /// The key takes a number.
    #[error("pin option `{0}` expects a number")]
    ExpectedNumber(PinKey),
    /// The key takes a fit mode string.
    #[error("pin option `{0}` expects a fit mode")]
    ExpectedMode(PinKey),
    /// The fit mode string is not `in`, `out` or `stretch`.
    #[error("unknown fit mode `{0}`")]
    InvalidMode(String),
}

/// A batch of pin writes, applied together.
///
/// Options run in insertion order. Resize and scale-to-size options run in
/// a second pass after every plain option, so `width` and `resizeWidth` in
/// the same batch see the new natural width.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PinUpdate {
    options: Vec<PinOption>,
}

impl PinUpdate {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option and returns the batch.
    #[must_use]
    pub fn with(mut self, option: PinOption) -> Self {
        self.options.push(option);
        self
    }

    /// Adds an option.
    pub fn push(&mut self, option: PinOption) {
        self.options.push(option);
    }

    /// Returns whether the batch carries no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Returns the options in insertion order.
    #[must_use]
    pub fn options(&self) -> &[PinOption] {
        &self.options
    }

    /// Folds `other` into this batch; later options override earlier ones.
    pub fn merge(&mut self, other: &Self) {
        self.options.extend_from_slice(&other.options);
    }
}

impl From<PinOption> for PinUpdate {
    fn from(option: PinOption) -> Self {
        Self {
            options: alloc::vec![option],
        }
    }
}

impl FromIterator<PinOption> for PinUpdate {
    fn from_iter<I: IntoIterator<Item = PinOption>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().collect(),
        }
    }
}

impl Extend<PinOption> for PinUpdate {
    fn extend<I: IntoIterator<Item = PinOption>>(&mut self, iter: I) {
        self.options.extend(iter);
    }
}

/// What a [`Pin::apply`] call actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinChange {
    /// Size, scale, skew, rotation or pivot changed.
    pub transform: bool,
    /// Offset, alignment or handle changed.
    pub translate: bool,
    /// Alpha or texture alpha changed.
    pub appearance: bool,
}

impl PinChange {
    /// Returns whether nothing changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.transform || self.translate || self.appearance)
    }
}

/// Last value of each secondary option in a batch.
#[derive(Default)]
struct Secondary {
    resize_mode: Option<FitMode>,
    resize_width: Option<f64>,
    resize_height: Option<f64>,
    scale_mode: Option<FitMode>,
    scale_width: Option<f64>,
    scale_height: Option<f64>,
}

impl Secondary {
    fn of(update: &PinUpdate) -> Self {
        let mut s = Self::default();
        for option in update.options() {
            match *option {
                PinOption::ResizeMode(m) => s.resize_mode = Some(m),
                PinOption::ResizeWidth(v) => s.resize_width = Some(v),
                PinOption::ResizeHeight(v) => s.resize_height = Some(v),
                PinOption::ScaleMode(m) => s.scale_mode = Some(m),
                PinOption::ScaleWidth(v) => s.scale_width = Some(v),
                PinOption::ScaleHeight(v) => s.scale_height = Some(v),
                _ => {}
            }
        }
        s
    }
}

// ---------------------------------------------------------------------------
// Pin
// ---------------------------------------------------------------------------

/// The part of a parent pin a child needs while recomputing its matrices.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ParentView {
    pub(crate) transform_ts: u64,
    pub(crate) matrix_ts: u64,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) absolute: Affine,
}

/// Transform descriptor of one node.
#[derive(Clone, Debug)]
pub struct Pin {
    // -- Inputs --
    alpha: f64,
    texture_alpha: f64,
    width: f64,
    height: f64,
    natural_width: f64,
    natural_height: f64,
    scale_x: f64,
    scale_y: f64,
    skew_x: f64,
    skew_y: f64,
    rotation: f64,
    pivoted: bool,
    pivot_x: f64,
    pivot_y: f64,
    handled: bool,
    handle_x: f64,
    handle_y: f64,
    aligned: bool,
    align_x: f64,
    align_y: f64,
    offset_x: f64,
    offset_y: f64,

    // -- Derived --
    relative: Matrix,
    absolute: Matrix,
    bound: Rect,
    position: Point,

    // -- Stamps --
    transform_ts: u64,
    translate_ts: u64,
    matrix_ts: u64,
    rel_mo: u64,
    abs_mo: u64,
    bound_mo: u64,
    handle_mo: u64,
    align_mo: u64,
}

impl Pin {
    /// Creates a pin with identity inputs, stamped by `clock`.
    pub fn new(clock: &mut VersionClock) -> Self {
        Self {
            alpha: 1.0,
            texture_alpha: 1.0,
            width: 0.0,
            height: 0.0,
            natural_width: 0.0,
            natural_height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            rotation: 0.0,
            pivoted: false,
            pivot_x: 0.0,
            pivot_y: 0.0,
            handled: false,
            handle_x: 0.0,
            handle_y: 0.0,
            aligned: false,
            align_x: 0.0,
            align_y: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            relative: Matrix::new(),
            absolute: Matrix::new(),
            bound: Rect::ZERO,
            position: Point::ZERO,
            translate_ts: clock.advance(),
            transform_ts: clock.advance(),
            matrix_ts: clock.advance(),
            rel_mo: 0,
            abs_mo: 0,
            bound_mo: 0,
            handle_mo: 0,
            align_mo: 0,
        }
    }

    // -- Writes --

    /// Applies a batch of options and returns what changed.
    ///
    /// Advances `clock` at most once for translation inputs and once for
    /// transform inputs. Alpha writes advance nothing: they only affect
    /// painting, which reads them directly.
    pub fn apply(&mut self, update: &PinUpdate, clock: &mut VersionClock) -> PinChange {
        let mut change = PinChange::default();
        for option in update.options() {
            if !option.is_secondary() {
                self.set_primary(*option, &mut change);
            }
        }
        if update.options().iter().any(PinOption::is_secondary) {
            let batch = Secondary::of(update);
            for option in update.options() {
                self.set_secondary(*option, &batch, &mut change);
            }
        }
        if change.translate {
            self.translate_ts = clock.advance();
        }
        if change.transform {
            self.transform_ts = clock.advance();
        }
        change
    }

    fn set_primary(&mut self, option: PinOption, change: &mut PinChange) {
        match option {
            PinOption::Alpha(v) => change.appearance |= assign(&mut self.alpha, v),
            PinOption::TextureAlpha(v) => {
                change.appearance |= assign(&mut self.texture_alpha, v);
            }
            PinOption::Width(v) => {
                change.transform |= assign(&mut self.natural_width, v) | assign(&mut self.width, v);
            }
            PinOption::Height(v) => {
                change.transform |=
                    assign(&mut self.natural_height, v) | assign(&mut self.height, v);
            }
            PinOption::Scale(v) => {
                change.transform |= assign(&mut self.scale_x, v) | assign(&mut self.scale_y, v);
            }
            PinOption::ScaleX(v) => change.transform |= assign(&mut self.scale_x, v),
            PinOption::ScaleY(v) => change.transform |= assign(&mut self.scale_y, v),
            PinOption::Skew(v) => {
                change.transform |= assign(&mut self.skew_x, v) | assign(&mut self.skew_y, v);
            }
            PinOption::SkewX(v) => change.transform |= assign(&mut self.skew_x, v),
            PinOption::SkewY(v) => change.transform |= assign(&mut self.skew_y, v),
            PinOption::Rotation(v) => change.transform |= assign(&mut self.rotation, v),
            PinOption::Pivot(v) => {
                change.transform |= assign(&mut self.pivot_x, v)
                    | assign(&mut self.pivot_y, v)
                    | enable(&mut self.pivoted);
            }
            PinOption::PivotX(v) => {
                change.transform |= assign(&mut self.pivot_x, v) | enable(&mut self.pivoted);
            }
            PinOption::PivotY(v) => {
                change.transform |= assign(&mut self.pivot_y, v) | enable(&mut self.pivoted);
            }
            PinOption::Offset(v) => {
                change.translate |= assign(&mut self.offset_x, v) | assign(&mut self.offset_y, v);
            }
            PinOption::OffsetX(v) => change.translate |= assign(&mut self.offset_x, v),
            PinOption::OffsetY(v) => change.translate |= assign(&mut self.offset_y, v),
            PinOption::Align(v) => {
                self.set_primary(PinOption::AlignX(v), change);
                self.set_primary(PinOption::AlignY(v), change);
            }
            PinOption::AlignX(v) => {
                change.translate |= assign(&mut self.align_x, v) | enable(&mut self.aligned);
                self.set_primary(PinOption::HandleX(v), change);
            }
            PinOption::AlignY(v) => {
                change.translate |= assign(&mut self.align_y, v) | enable(&mut self.aligned);
                self.set_primary(PinOption::HandleY(v), change);
            }
            PinOption::Handle(v) => {
                self.set_primary(PinOption::HandleX(v), change);
                self.set_primary(PinOption::HandleY(v), change);
            }
            PinOption::HandleX(v) => {
                change.translate |= assign(&mut self.handle_x, v) | enable(&mut self.handled);
            }
            PinOption::HandleY(v) => {
                change.translate |= assign(&mut self.handle_y, v) | enable(&mut self.handled);
            }
            PinOption::ResizeMode(_)
            | PinOption::ResizeWidth(_)
            | PinOption::ResizeHeight(_)
            | PinOption::ScaleMode(_)
            | PinOption::ScaleWidth(_)
            | PinOption::ScaleHeight(_) => {}
        }
    }

    fn set_secondary(&mut self, option: PinOption, batch: &Secondary, change: &mut PinChange) {
        let (nw, nh) = (self.natural_width, self.natural_height);
        match option {
            PinOption::ResizeMode(mode) => {
                let (Some(rw), Some(rh)) = (batch.resize_width, batch.resize_height) else {
                    return;
                };
                if nw == 0.0 || nh == 0.0 {
                    return;
                }
                let (sx, sy) = mode.unify(rw / nw, rh / nh);
                change.transform |= assign(&mut self.scale_x, sx)
                    | assign(&mut self.scale_y, sy)
                    | assign(&mut self.width, rw / sx)
                    | assign(&mut self.height, rh / sy);
            }
            PinOption::ResizeWidth(v) if batch.resize_mode.is_none() && nw != 0.0 => {
                change.transform |= assign(&mut self.scale_x, v / nw) | assign(&mut self.width, nw);
            }
            PinOption::ResizeHeight(v) if batch.resize_mode.is_none() && nh != 0.0 => {
                change.transform |=
                    assign(&mut self.scale_y, v / nh) | assign(&mut self.height, nh);
            }
            PinOption::ScaleMode(mode) => {
                let (Some(sw), Some(sh)) = (batch.scale_width, batch.scale_height) else {
                    return;
                };
                if nw == 0.0 || nh == 0.0 {
                    return;
                }
                let (sx, sy) = mode.unify(sw / nw, sh / nh);
                change.transform |= assign(&mut self.scale_x, sx) | assign(&mut self.scale_y, sy);
            }
            PinOption::ScaleWidth(v) if batch.scale_mode.is_none() && nw != 0.0 => {
                change.transform |= assign(&mut self.scale_x, v / nw);
            }
            PinOption::ScaleHeight(v) if batch.scale_mode.is_none() && nh != 0.0 => {
                change.transform |= assign(&mut self.scale_y, v / nh);
            }
            _ => {}
        }
    }

    // -- Reads --

    /// Returns the current value of a numeric option.
    ///
    /// Combined keys report their horizontal component. Mode and
    /// target-size keys are write-only and return `None`.
    #[must_use]
    pub fn get(&self, key: PinKey) -> Option<f64> {
        Some(match key {
            PinKey::Alpha => self.alpha,
            PinKey::TextureAlpha => self.texture_alpha,
            PinKey::Width => self.width,
            PinKey::Height => self.height,
            PinKey::Scale | PinKey::ScaleX => self.scale_x,
            PinKey::ScaleY => self.scale_y,
            PinKey::Skew | PinKey::SkewX => self.skew_x,
            PinKey::SkewY => self.skew_y,
            PinKey::Rotation => self.rotation,
            PinKey::Pivot | PinKey::PivotX => self.pivot_x,
            PinKey::PivotY => self.pivot_y,
            PinKey::Offset | PinKey::OffsetX => self.offset_x,
            PinKey::OffsetY => self.offset_y,
            PinKey::Align | PinKey::AlignX => self.align_x,
            PinKey::AlignY => self.align_y,
            PinKey::Handle | PinKey::HandleX => self.handle_x,
            PinKey::HandleY => self.handle_y,
            PinKey::ResizeMode
            | PinKey::ResizeWidth
            | PinKey::ResizeHeight
            | PinKey::ScaleMode
            | PinKey::ScaleWidth
            | PinKey::ScaleHeight => return None,
        })
    }

    /// Current width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Current height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Size last written through `width`/`height`, before any resize.
    #[must_use]
    pub fn natural_size(&self) -> Size {
        Size::new(self.natural_width, self.natural_height)
    }

    /// Opacity of the node and its subtree.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Opacity of the node's own payloads.
    #[must_use]
    pub fn texture_alpha(&self) -> f64 {
        self.texture_alpha
    }

    /// Offset in parent pixels.
    #[must_use]
    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    /// Whether a pivot is set.
    #[must_use]
    pub fn is_pivoted(&self) -> bool {
        self.pivoted
    }

    /// Whether a handle is set.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Whether the node aligns to its parent.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Cached relative matrix, as of the last refresh.
    #[must_use]
    pub fn relative_matrix(&self) -> &Matrix {
        &self.relative
    }

    /// Cached absolute matrix, as of the last refresh.
    #[must_use]
    pub fn absolute_matrix(&self) -> &Matrix {
        &self.absolute
    }

    /// Cached axis-aligned bound, as of the last refresh.
    #[must_use]
    pub fn bound(&self) -> Rect {
        self.bound
    }

    /// Translation applied by the last relative-matrix refresh.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Stamp of the last transform input change.
    #[must_use]
    pub fn transform_stamp(&self) -> u64 {
        self.transform_ts
    }

    /// Stamp of the last translation input change.
    #[must_use]
    pub fn translate_stamp(&self) -> u64 {
        self.translate_ts
    }

    /// Stamp of the last absolute matrix recomputation.
    #[must_use]
    pub fn matrix_stamp(&self) -> u64 {
        self.matrix_ts
    }

    // -- Evaluation --

    pub(crate) fn view(&self) -> ParentView {
        ParentView {
            transform_ts: self.transform_ts,
            matrix_ts: self.matrix_ts,
            width: self.width,
            height: self.height,
            absolute: self.absolute.as_affine(),
        }
    }

    /// Per-frame step: a handled pin re-derives its position when its own
    /// transform changed, an aligned pin when its parent's did.
    pub(crate) fn tick(&mut self, parent_transform_ts: Option<u64>, clock: &mut VersionClock) {
        if self.handled && self.handle_mo != self.transform_ts {
            self.handle_mo = self.transform_ts;
            self.translate_ts = clock.advance();
        }
        if let Some(parent_ts) = parent_transform_ts
            && self.aligned
            && self.align_mo != parent_ts
        {
            self.align_mo = parent_ts;
            self.translate_ts = clock.advance();
        }
    }

    /// Recomputes the relative matrix if any input is newer than it.
    ///
    /// `parent_ts` is the owning node's "parent changed" stamp. Returns
    /// whether a recomputation happened.
    pub(crate) fn refresh_relative(&mut self, parent: Option<&ParentView>, parent_ts: u64) -> bool {
        let deps = [
            self.transform_ts,
            self.translate_ts,
            parent.map_or(0, |p| p.transform_ts),
            parent_ts,
        ];
        if !is_stale(self.rel_mo, &deps) {
            return false;
        }
        self.rel_mo = newest(&deps);

        let (pw, ph) = (self.pivot_x * self.width, self.pivot_y * self.height);
        let rel = &mut self.relative;
        rel.identity();
        if self.pivoted {
            rel.translate(-pw, -ph);
        }
        rel.scale(self.scale_x, self.scale_y)
            .rotate(self.rotation)
            .skew(self.skew_x, self.skew_y);
        if self.pivoted {
            rel.translate(pw, ph);
        }

        self.refresh_bound();

        let mut x = self.offset_x - self.bound.x0;
        let mut y = self.offset_y - self.bound.y0;
        if self.handled {
            x -= self.handle_x * self.bound.width();
            y -= self.handle_y * self.bound.height();
        }
        if let Some(p) = parent
            && self.aligned
        {
            x += self.align_x * p.width;
            y += self.align_y * p.height;
        }
        self.position = Point::new(x, y);
        self.relative.translate(x, y);
        true
    }

    /// Recomputes the absolute matrix if any input is newer than it.
    ///
    /// Advances `clock` into this pin's matrix stamp on recomputation so
    /// that children observe the change.
    pub(crate) fn refresh_absolute(
        &mut self,
        parent: Option<&ParentView>,
        parent_ts: u64,
        clock: &mut VersionClock,
    ) -> bool {
        let deps = [
            self.transform_ts,
            self.translate_ts,
            parent.map_or(0, |p| p.matrix_ts),
            parent_ts,
        ];
        if !is_stale(self.abs_mo, &deps) {
            return false;
        }
        self.abs_mo = newest(&deps);

        self.refresh_relative(parent, parent_ts);
        self.absolute.copy_from(&self.relative);
        if let Some(p) = parent {
            self.absolute.concat(&Matrix::from_affine(p.absolute));
        }
        self.matrix_ts = clock.advance();
        true
    }

    /// Recomputes the axis-aligned bound of the scaled, rotated and skewed
    /// size. A pivoted pin reports its untransformed size.
    pub(crate) fn refresh_bound(&mut self) {
        if !is_stale(self.bound_mo, &[self.transform_ts]) {
            return;
        }
        self.bound_mo = self.transform_ts;

        if self.pivoted {
            self.bound = Rect::new(0.0, 0.0, self.width, self.height);
            return;
        }

        let mut m = Matrix::new();
        m.scale(self.scale_x, self.scale_y)
            .rotate(self.rotation)
            .skew(self.skew_x, self.skew_y);
        let [a, b, c, d, _, _] = m.coeffs();
        let (x0, w) = span(a, c, self.width, self.height);
        let (y0, h) = span(b, d, self.width, self.height);
        self.bound = Rect::new(x0, y0, x0 + w, y0 + h);
    }
}

/// Origin and extent along one axis of the box `(0, 0, w, h)` mapped by a
/// row `(p, q)` of a linear map.
fn span(p: f64, q: f64, w: f64, h: f64) -> (f64, f64) {
    let (lo, hi) = if (p > 0.0 && q > 0.0) || (p < 0.0 && q < 0.0) {
        (0.0, p * w + q * h)
    } else {
        (p * w, q * h)
    };
    (lo.min(hi), (lo - hi).abs())
}

fn assign(field: &mut f64, value: f64) -> bool {
    if *field == value {
        false
    } else {
        *field = value;
        true
    }
}

fn enable(flag: &mut bool) -> bool {
    !core::mem::replace(flag, true)
}
