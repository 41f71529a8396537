//! Small hand-assembled layout tables for tests.

use std::collections::HashMap;

use font_types::Scalar;

/// A builder for big-endian tables, with named locations for patching
/// offsets once the target is known.
#[derive(Clone, Debug, Default)]
pub(crate) struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    pub fn push_with_tag(self, item: impl Scalar, tag: &str) -> Self {
        self.mark(tag).push(item)
    }

    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self = self.push(item);
        }
        self
    }

    /// Append raw bytes, such as a whole subtable.
    pub fn append(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn mark(mut self, tag: &str) -> Self {
        self.tagged_locations.insert(tag.to_string(), self.data.len());
        self
    }

    pub fn offset_for(&self, tag: &str) -> usize {
        self.tagged_locations[tag]
    }

    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        let offset = self.offset_for(tag);
        let raw = item.to_raw();
        let bytes: &[u8] = raw.as_ref();
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Store the distance from `base` to `target` as a u16 at `field`.
    pub fn write_offset16(&mut self, field: &str, base: &str, target: &str) {
        let offset = self.offset_for(target) - self.offset_for(base);
        self.write_at(field, offset as u16);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// A ligature subtable covering glyph 10.
///
/// Its one set starts with `padding` ligatures of `50 51` that never match,
/// then `10 11 12 -> 100`, `10 11 -> 101` and the single glyph `10 -> 102`.
pub(crate) fn ligature_subtable(padding: u16) -> Vec<u8> {
    let mut ligatures: Vec<Vec<u16>> = (0..padding).map(|k| vec![200 + k, 3, 50, 51]).collect();
    ligatures.extend([vec![100, 3, 11, 12], vec![101, 2, 11], vec![102, 1]]);

    let mut buf = BeBuffer::new()
        .push(1u16)
        .push_with_tag(0u16, "coverage")
        .push(1u16)
        .push_with_tag(0u16, "set")
        .mark("coverage_data")
        .extend([1u16, 1, 10])
        .mark("set_data")
        .push(ligatures.len() as u16);
    for i in 0..ligatures.len() {
        buf = buf.push_with_tag(0u16, &format!("lig{i}"));
    }
    for (i, ligature) in ligatures.iter().enumerate() {
        buf = buf.mark(&format!("lig{i}_data")).extend(ligature.iter().copied());
    }
    buf.write_at("coverage", buf.offset_for("coverage_data") as u16);
    buf.write_at("set", buf.offset_for("set_data") as u16);
    for i in 0..ligatures.len() {
        buf.write_offset16(&format!("lig{i}"), "set_data", &format!("lig{i}_data"));
    }
    buf.into_vec()
}

/// A pair subtable kerning glyph 2 against glyph 5 by -60.
///
/// Glyphs 1 and 2 are covered; glyph 2 is in first class 1 and glyph 5 in
/// second class 1. With a second value format the second glyph of that
/// pair gets +30.
pub(crate) fn pair_subtable(value_format2: u16) -> Vec<u8> {
    let values: Vec<i16> = if value_format2 == 0 {
        vec![0, 0, 0, -60]
    } else {
        vec![0, 0, 0, 0, 0, 0, -60, 30]
    };
    let mut buf = BeBuffer::new()
        .push(2u16)
        .push_with_tag(0u16, "coverage")
        // x advance only
        .push(0x0004u16)
        .push(value_format2)
        .push_with_tag(0u16, "class_def1")
        .push_with_tag(0u16, "class_def2")
        .extend([2u16, 2])
        .extend(values)
        .mark("coverage_data")
        .extend([1u16, 2, 1, 2])
        .mark("class_def1_data")
        .extend([1u16, 2, 1, 1])
        .mark("class_def2_data")
        .extend([1u16, 5, 1, 1]);
    for name in ["coverage", "class_def1", "class_def2"] {
        let target = buf.offset_for(&format!("{name}_data"));
        buf.write_at(name, target as u16);
    }
    buf.into_vec()
}

/// A cursive subtable covering glyphs 1, 2 and 3.
///
/// Glyph 1 only exits at (500, 100); glyph 2 enters at (0, 50) and exits at
/// (400, 200); glyph 3 only enters at (10, 0).
pub(crate) fn cursive_subtable() -> Vec<u8> {
    let mut buf = BeBuffer::new()
        .push(1u16)
        .push_with_tag(0u16, "coverage")
        .push(3u16)
        .push(0u16)
        .push_with_tag(0u16, "exit1")
        .push_with_tag(0u16, "entry2")
        .push_with_tag(0u16, "exit2")
        .push_with_tag(0u16, "entry3")
        .push(0u16)
        .mark("coverage_data")
        .extend([1u16, 3, 1, 2, 3]);
    for (name, x, y) in [
        ("exit1", 500i16, 100i16),
        ("entry2", 0, 50),
        ("exit2", 400, 200),
        ("entry3", 10, 0),
    ] {
        buf = buf.mark(&format!("{name}_data")).push(1u16).extend([x, y]);
    }
    buf.write_at("coverage", buf.offset_for("coverage_data") as u16);
    for name in ["exit1", "entry2", "exit2", "entry3"] {
        let target = buf.offset_for(&format!("{name}_data"));
        buf.write_at(name, target as u16);
    }
    buf.into_vec()
}

/// A version 1.0 layout table whose lookup list holds one lookup per entry
/// of `lookups`, each with a single subtable.
fn layout_table(lookups: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut buf = BeBuffer::new()
        .extend([1u16, 0])
        .push_with_tag(0u16, "scripts")
        .push_with_tag(0u16, "features")
        .push_with_tag(0u16, "lookups")
        // empty script and feature lists
        .mark("scripts_data")
        .push(0u16)
        .mark("features_data")
        .push(0u16)
        .mark("lookups_data")
        .push(lookups.len() as u16);
    for i in 0..lookups.len() {
        buf = buf.push_with_tag(0u16, &format!("lookup{i}"));
    }
    for (i, (lookup_type, subtable)) in lookups.iter().enumerate() {
        buf = buf
            .mark(&format!("lookup{i}_data"))
            .push(*lookup_type)
            // lookup flag, subtable count
            .extend([0u16, 1])
            .push_with_tag(0u16, &format!("subtable{i}"))
            .mark(&format!("subtable{i}_data"))
            .append(subtable);
    }
    for name in ["scripts", "features", "lookups"] {
        let target = buf.offset_for(&format!("{name}_data"));
        buf.write_at(name, target as u16);
    }
    for i in 0..lookups.len() {
        buf.write_offset16(&format!("lookup{i}"), "lookups_data", &format!("lookup{i}_data"));
        buf.write_offset16(
            &format!("subtable{i}"),
            &format!("lookup{i}_data"),
            &format!("subtable{i}_data"),
        );
    }
    buf.into_vec()
}

/// A GSUB table with one ligature lookup; see [`ligature_subtable`].
pub(crate) fn gsub_ligatures(padding: u16) -> Vec<u8> {
    layout_table(&[(4, ligature_subtable(padding))])
}

/// [`gsub_ligatures`] with the subtable behind an extension subtable.
pub(crate) fn gsub_ligatures_in_extension() -> Vec<u8> {
    let extension = BeBuffer::new()
        .extend([1u16, 4])
        // the wrapped subtable follows the 8 byte header
        .push(8u32)
        .append(&ligature_subtable(0))
        .into_vec();
    layout_table(&[(7, extension)])
}

/// A GPOS table with a pair lookup (0) and a cursive lookup (1); see
/// [`pair_subtable`] and [`cursive_subtable`].
pub(crate) fn gpos_pair_and_cursive() -> Vec<u8> {
    layout_table(&[(2, pair_subtable(0)), (3, cursive_subtable())])
}
