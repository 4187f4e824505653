// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture registry and `texture:name` selectors.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::out::{Cutout, ImageSlot, Out};
use crate::surface::ImageId;

/// Registration data for one texture.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureDef {
    /// Name used as the selector prefix.
    pub name: String,
    /// Image pixels per cutout pixel.
    pub image_ratio: f64,
    /// Factor applied to every cutout coordinate at registration.
    pub ratio: f64,
    /// Inset removed from every cutout edge at registration (after `ratio`).
    pub trim: f64,
    /// Regions of the texture.
    pub cutouts: Vec<Cutout>,
    /// Image, if already loaded.
    pub image: Option<ImageId>,
}

impl TextureDef {
    /// Creates an empty definition with unit ratios.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_ratio: 1.0,
            ratio: 1.0,
            trim: 0.0,
            cutouts: Vec::new(),
            image: None,
        }
    }

    /// Adds a cutout.
    #[must_use]
    pub fn with_cutout(mut self, cutout: Cutout) -> Self {
        self.cutouts.push(cutout);
        self
    }

    /// Sets the coordinate ratio.
    #[must_use]
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    /// Sets the image ratio.
    #[must_use]
    pub fn with_image_ratio(mut self, image_ratio: f64) -> Self {
        self.image_ratio = image_ratio;
        self
    }

    /// Sets the trim inset.
    #[must_use]
    pub fn with_trim(mut self, trim: f64) -> Self {
        self.trim = trim;
        self
    }

    /// Sets the image.
    #[must_use]
    pub fn with_image(mut self, image: ImageId) -> Self {
        self.image = Some(image);
        self
    }
}

/// Error returned by [`Atlas`] lookups.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// The selector has no `texture:` prefix.
    #[error("invalid selector: '{0}'")]
    InvalidSelector(String),
    /// No texture is registered under this name.
    #[error("unknown texture '{0}'")]
    UnknownTexture(String),
    /// No cutout matches the selector.
    #[error("'{0}' cutout not found")]
    NotFound(String),
}

#[derive(Debug)]
struct Texture {
    cutouts: Vec<Cutout>,
    image: ImageSlot,
    image_ratio: f64,
    exact: BTreeMap<String, Option<usize>>,
    prefixed: BTreeMap<String, Vec<usize>>,
}

impl Texture {
    fn out(&self, idx: usize) -> Out {
        Out::new(
            self.cutouts[idx].clone(),
            self.image.clone(),
            self.image_ratio,
        )
    }
}

/// All registered textures, keyed by name.
#[derive(Debug, Default)]
pub struct Atlas {
    textures: BTreeMap<String, Texture>,
}

impl Atlas {
    /// Creates an empty atlas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a texture, replacing any texture with the same name.
    ///
    /// Every cutout is scaled by `ratio` and then shrunk by `trim` on each
    /// edge.
    pub fn add_texture(&mut self, def: TextureDef) {
        let TextureDef {
            name,
            image_ratio,
            ratio,
            trim,
            mut cutouts,
            image,
        } = def;
        for c in &mut cutouts {
            c.x *= ratio;
            c.y *= ratio;
            c.width *= ratio;
            c.height *= ratio;
            c.top *= ratio;
            c.bottom *= ratio;
            c.left *= ratio;
            c.right *= ratio;
            if trim != 0.0 {
                c.x += trim;
                c.y += trim;
                c.width -= 2.0 * trim;
                c.height -= 2.0 * trim;
                c.top -= trim;
                c.bottom -= trim;
                c.left -= trim;
                c.right -= trim;
            }
        }
        let image = match image {
            Some(id) => ImageSlot::filled(id),
            None => ImageSlot::new(),
        };
        self.textures.insert(
            name,
            Texture {
                cutouts,
                image,
                image_ratio,
                exact: BTreeMap::new(),
                prefixed: BTreeMap::new(),
            },
        );
    }

    /// Returns whether a texture is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    /// Sets the loaded image of a texture; existing outs pick it up.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::UnknownTexture`] if no such texture exists.
    pub fn set_image(&mut self, texture: &str, image: ImageId) -> Result<(), SelectError> {
        let tex = self
            .textures
            .get(texture)
            .ok_or_else(|| SelectError::UnknownTexture(String::from(texture)))?;
        tex.image.set(Some(image));
        Ok(())
    }

    /// Returns a fresh out for the cutout named by `texture:name`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError`] for a selector without a `:`, an unknown
    /// texture, or a missing cutout.
    pub fn select(&mut self, selector: &str) -> Result<Out, SelectError> {
        let (texture, name) = split(selector)?;
        let tex = self.texture_mut(texture)?;
        if !tex.exact.contains_key(name) {
            let found = tex.cutouts.iter().position(|c| c.name == name);
            tex.exact.insert(String::from(name), found);
        }
        match tex.exact.get(name).copied().flatten() {
            Some(idx) => Ok(tex.out(idx)),
            None => Err(SelectError::NotFound(String::from(selector))),
        }
    }

    /// Returns fresh outs for every cutout whose name starts with the name
    /// part of `texture:prefix`, in definition order.
    ///
    /// # Errors
    ///
    /// As [`select`](Self::select); an empty match is
    /// [`SelectError::NotFound`].
    pub fn select_prefix(&mut self, selector: &str) -> Result<Vec<Out>, SelectError> {
        let (texture, prefix) = split(selector)?;
        let tex = self.texture_mut(texture)?;
        if !tex.prefixed.contains_key(prefix) {
            let found = tex
                .cutouts
                .iter()
                .enumerate()
                .filter(|(_, c)| c.name.starts_with(prefix))
                .map(|(i, _)| i)
                .collect();
            tex.prefixed.insert(String::from(prefix), found);
        }
        let indices = tex.prefixed.get(prefix).map(Vec::as_slice).unwrap_or(&[]);
        if indices.is_empty() {
            return Err(SelectError::NotFound(String::from(selector)));
        }
        Ok(indices.iter().map(|&i| tex.out(i)).collect())
    }

    fn texture_mut(&mut self, name: &str) -> Result<&mut Texture, SelectError> {
        self.textures
            .get_mut(name)
            .ok_or_else(|| SelectError::UnknownTexture(String::from(name)))
    }
}

fn split(selector: &str) -> Result<(&str, &str), SelectError> {
    selector
        .split_once(':')
        .ok_or_else(|| SelectError::InvalidSelector(String::from(selector)))
}
