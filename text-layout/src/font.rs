//! A face at a size.

use std::sync::Arc;

use shaper::FaceData;

/// Font data shared between texts, scaled to a point size.
///
/// Two fonts are equal when they share the same face data and size.
#[derive(Clone, Debug)]
pub struct Font {
    face: Arc<FaceData>,
    size: f32,
}

impl Font {
    pub fn new(face: Arc<FaceData>, size: f32) -> Self {
        Font { face, size }
    }

    pub fn face(&self) -> &FaceData {
        &self.face
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// The same face at another size.
    pub fn with_size(&self, size: f32) -> Self {
        Font {
            face: self.face.clone(),
            size,
        }
    }

    /// Converts font units to this font's units.
    pub fn scale(&self) -> f32 {
        match self.face.units_per_em() {
            0 => 0.0,
            upem => self.size / upem as f32,
        }
    }

    /// Distance from the baseline to the top of the tallest glyphs.
    pub fn ascent(&self) -> f32 {
        self.face.ascender() as f32 * self.scale()
    }

    /// Distance from the baseline down to the lowest glyphs, as a positive
    /// number.
    pub fn descent(&self) -> f32 {
        -(self.face.descender() as f32) * self.scale()
    }

    pub fn height(&self) -> f32 {
        self.ascent() + self.descent()
    }
}

impl Default for Font {
    /// A face with no glyphs at 15 points.
    fn default() -> Self {
        Font::new(Arc::new(FaceData::new(1000)), 15.0)
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.face, &other.face) && self.size == other.size
    }
}
