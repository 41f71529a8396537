//! The [Font Variations](https://docs.microsoft.com/en-us/typography/opentype/spec/fvar) table

use std::collections::HashMap;
use std::hash::BuildHasher;

use types::{Fixed, FixedSize, NameId, Scalar, Tag};

use crate::collections::U32Set;
use crate::font_data::{FontData, ScalarArray};
use crate::read::{FontRead, ReadError};

/// The only axis record size this parser understands.
pub const AXIS_RECORD_SIZE: u16 = 20;

/// The size of the fixed part of the table.
pub const FVAR_HEADER_LEN: usize = 16;

/// The normalized value of an axis at its maximum, in 2.14 units.
pub const NORMALIZED_MAX: i32 = 1 << 14;

/// A [VariationAxisRecord](https://learn.microsoft.com/en-us/typography/opentype/spec/fvar#variationaxisrecord)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisRecord {
    pub axis_tag: Tag,
    pub min_value: Fixed,
    pub default_value: Fixed,
    pub max_value: Fixed,
    pub flags: u16,
    pub axis_name_id: NameId,
}

impl AxisRecord {
    /// The axis should not be exposed in user interfaces.
    pub const HIDDEN_AXIS: u16 = 0x0001;

    pub fn is_hidden(&self) -> bool {
        self.flags & Self::HIDDEN_AXIS != 0
    }

    /// Returns `(min, default, max)` with min and max widened to include the default.
    ///
    /// Fonts in the wild sometimes store a minimum above the default (or a
    /// maximum below it); the ordered triple keeps the normalization math sane.
    pub fn coordinates(&self) -> (f32, f32, f32) {
        let default = self.default_value.to_f32();
        let min = default.min(self.min_value.to_f32());
        let max = default.max(self.max_value.to_f32());
        (min, default, max)
    }

    /// Map a user space value onto the normalized range, in 2.14 units.
    ///
    /// The value is clamped to the axis range first. The default maps to
    /// exactly zero.
    pub fn normalize_axis_value(&self, value: f32) -> i32 {
        let (min, default, max) = self.coordinates();
        let value = value.clamp(min, max);
        if value == default {
            return 0;
        }
        let normalized = if value < default {
            (value - default) / (default - min)
        } else {
            (value - default) / (max - default)
        };
        (normalized * NORMALIZED_MAX as f32).round() as i32
    }

    /// The inverse of [`normalize_axis_value`](Self::normalize_axis_value).
    pub fn unnormalize_axis_value(&self, value: i32) -> f32 {
        let (min, default, max) = self.coordinates();
        match value.cmp(&0) {
            std::cmp::Ordering::Equal => default,
            std::cmp::Ordering::Less => {
                value as f32 * (default - min) / NORMALIZED_MAX as f32 + default
            }
            std::cmp::Ordering::Greater => {
                value as f32 * (max - default) / NORMALIZED_MAX as f32 + default
            }
        }
    }

    /// The public description of this axis at position `axis_index`.
    pub fn axis_info(&self, axis_index: usize) -> AxisInfo {
        let (min_value, default_value, max_value) = self.coordinates();
        AxisInfo {
            axis_index,
            tag: self.axis_tag,
            name_id: self.axis_name_id,
            flags: self.flags,
            min_value,
            default_value,
            max_value,
        }
    }
}

impl Scalar for AxisRecord {
    type Raw = [u8; 20];

    fn from_raw(raw: Self::Raw) -> Self {
        let fixed = |at: usize| {
            Fixed::from_bits(i32::from_be_bytes([
                raw[at],
                raw[at + 1],
                raw[at + 2],
                raw[at + 3],
            ]))
        };
        AxisRecord {
            axis_tag: Tag::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            min_value: fixed(4),
            default_value: fixed(8),
            max_value: fixed(12),
            flags: u16::from_be_bytes([raw[16], raw[17]]),
            axis_name_id: NameId::new(u16::from_be_bytes([raw[18], raw[19]])),
        }
    }

    fn to_raw(self) -> Self::Raw {
        let mut raw = [0u8; 20];
        raw[0..4].copy_from_slice(&self.axis_tag.to_be_bytes());
        raw[4..8].copy_from_slice(&self.min_value.to_bits().to_be_bytes());
        raw[8..12].copy_from_slice(&self.default_value.to_bits().to_be_bytes());
        raw[12..16].copy_from_slice(&self.max_value.to_bits().to_be_bytes());
        raw[16..18].copy_from_slice(&self.flags.to_be_bytes());
        raw[18..20].copy_from_slice(&self.axis_name_id.to_u16().to_be_bytes());
        raw
    }
}

/// Axis information in user space units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisInfo {
    pub axis_index: usize,
    pub tag: Tag,
    pub name_id: NameId,
    pub flags: u16,
    pub min_value: f32,
    pub default_value: f32,
    pub max_value: f32,
}

impl AxisInfo {
    pub fn is_hidden(&self) -> bool {
        self.flags & AxisRecord::HIDDEN_AXIS != 0
    }
}

/// A limit placed on an axis when instancing.
///
/// A limit whose minimum equals its maximum pins the axis to that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisLimit {
    pub minimum: f64,
    pub middle: f64,
    pub maximum: f64,
}

impl AxisLimit {
    pub fn new(minimum: f64, middle: f64, maximum: f64) -> Self {
        AxisLimit {
            minimum,
            middle,
            maximum,
        }
    }

    pub fn point(value: f64) -> Self {
        AxisLimit::new(value, value, value)
    }

    pub fn is_point(&self) -> bool {
        self.minimum == self.maximum
    }

    /// Whether a named instance located at `coord` survives this limit.
    ///
    /// Pinned axes only keep instances exactly at the pin.
    pub fn keeps(&self, coord: f64) -> bool {
        if self.is_point() {
            self.minimum == coord
        } else {
            (self.minimum..=self.maximum).contains(&coord)
        }
    }
}

/// A [InstanceRecord](https://learn.microsoft.com/en-us/typography/opentype/spec/fvar#instancerecord)
#[derive(Clone, Debug)]
pub struct InstanceRecord<'a> {
    pub subfamily_name_id: NameId,
    pub flags: u16,
    /// One user space coordinate per axis.
    pub coordinates: ScalarArray<'a, Fixed>,
    /// Present when the record is large enough to hold it.
    ///
    /// A stored value of [`NameId::UNSET`] is kept as is.
    pub post_script_name_id: Option<NameId>,
}

impl<'a> InstanceRecord<'a> {
    fn read(data: FontData<'a>, axis_count: u16, instance_size: u16) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let subfamily_name_id = cursor.read()?;
        let flags = cursor.read()?;
        let coordinates = cursor.read_array(axis_count as usize)?;
        let post_script_name_id = if has_post_script_name_id(axis_count, instance_size) {
            Some(cursor.read()?)
        } else {
            None
        };
        Ok(InstanceRecord {
            subfamily_name_id,
            flags,
            coordinates,
            post_script_name_id,
        })
    }

    /// Whether this instance survives the given axis limits.
    pub fn keep_instance<S: BuildHasher>(
        &self,
        axes: &[AxisRecord],
        limits: &HashMap<Tag, AxisLimit, S>,
    ) -> bool {
        if limits.is_empty() {
            return true;
        }
        for (i, coord) in self.coordinates.iter().enumerate() {
            let Some(axis) = axes.get(i) else {
                return false;
            };
            if let Some(limit) = limits.get(&axis.axis_tag) {
                if !limit.keeps(coord.to_f64()) {
                    return false;
                }
            }
        }
        true
    }
}

/// The presence of the optional PostScript name id is inferred from the record size.
pub fn has_post_script_name_id(axis_count: u16, instance_size: u16) -> bool {
    instance_size as usize >= axis_count as usize * Fixed::RAW_BYTE_LEN + 6
}

/// The fvar table.
#[derive(Clone, Debug)]
pub struct Fvar<'a> {
    data: FontData<'a>,
    axes_offset: u16,
    instance_size: u16,
    axes: ScalarArray<'a, AxisRecord>,
    instance_count: u16,
    instance_data: FontData<'a>,
}

impl<'a> FontRead<'a> for Fvar<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let major: u16 = cursor.read()?;
        let _minor: u16 = cursor.read()?;
        if major != 1 {
            return Err(ReadError::InvalidFormat(major.into()));
        }
        let axes_offset: u16 = cursor.read()?;
        let _reserved: u16 = cursor.read()?;
        let axis_count: u16 = cursor.read()?;
        let axis_size: u16 = cursor.read()?;
        let instance_count: u16 = cursor.read()?;
        let instance_size: u16 = cursor.read()?;
        if axis_size != AXIS_RECORD_SIZE {
            return Err(ReadError::MalformedData("unexpected axis record size"));
        }
        if (instance_size as usize) < axis_count as usize * Fixed::RAW_BYTE_LEN + 4 {
            return Err(ReadError::MalformedData("instance record too small"));
        }
        let axes = data.read_array::<AxisRecord>(axes_offset as usize, axis_count as usize)?;
        let instances_start = axes_offset as usize + axes.as_bytes().len();
        let instances_len = instance_count as usize * instance_size as usize;
        let instance_data = data
            .slice(instances_start..instances_start + instances_len)
            .ok_or(ReadError::OutOfBounds)?;
        Ok(Fvar {
            data,
            axes_offset,
            instance_size,
            axes,
            instance_count,
            instance_data,
        })
    }
}

impl<'a> Fvar<'a> {
    /// Returns `true` if `data` holds a table this parser accepts.
    pub fn sanitize(data: FontData<'a>) -> bool {
        Self::read(data).is_ok()
    }

    pub fn axis_count(&self) -> u16 {
        self.axes.len() as u16
    }

    pub fn axes(&self) -> ScalarArray<'a, AxisRecord> {
        self.axes
    }

    pub fn axes_offset(&self) -> u16 {
        self.axes_offset
    }

    pub fn instance_count(&self) -> u16 {
        self.instance_count
    }

    pub fn instance_size(&self) -> u16 {
        self.instance_size
    }

    pub fn has_post_script_name_ids(&self) -> bool {
        has_post_script_name_id(self.axis_count(), self.instance_size)
    }

    pub fn instance(&self, index: u16) -> Option<InstanceRecord<'a>> {
        if index >= self.instance_count {
            return None;
        }
        let start = index as usize * self.instance_size as usize;
        let data = self.instance_data.split_off(start)?;
        InstanceRecord::read(data, self.axis_count(), self.instance_size).ok()
    }

    pub fn instances(&self) -> impl Iterator<Item = InstanceRecord<'a>> + '_ {
        (0..self.instance_count).filter_map(|i| self.instance(i))
    }

    /// Info for up to `count` axes starting at `start`.
    pub fn axis_infos(&self, start: usize, count: usize) -> Vec<AxisInfo> {
        self.axes
            .iter()
            .enumerate()
            .skip(start)
            .take(count)
            .map(|(i, axis)| axis.axis_info(i))
            .collect()
    }

    /// Returns the info for the first axis with the given tag.
    pub fn find_axis(&self, tag: Tag) -> Option<AxisInfo> {
        self.axes
            .iter()
            .enumerate()
            .find(|(_, axis)| axis.axis_tag == tag)
            .map(|(i, axis)| axis.axis_info(i))
    }

    /// Normalize `value` on the axis at `axis_index`; out of range axes yield 0.
    pub fn normalize_axis_value(&self, axis_index: usize, value: f32) -> i32 {
        self.axes
            .get(axis_index)
            .map(|axis| axis.normalize_axis_value(value))
            .unwrap_or_default()
    }

    pub fn unnormalize_axis_value(&self, axis_index: usize, value: i32) -> f32 {
        self.axes
            .get(axis_index)
            .map(|axis| axis.unnormalize_axis_value(value))
            .unwrap_or_default()
    }

    pub fn instance_subfamily_name_id(&self, index: u16) -> Option<NameId> {
        self.instance(index).map(|inst| inst.subfamily_name_id)
    }

    pub fn instance_post_script_name_id(&self, index: u16) -> Option<NameId> {
        self.instance(index).and_then(|inst| inst.post_script_name_id)
    }

    /// Copy the user space coordinates of an instance into `out`.
    ///
    /// Returns the axis count, or 0 if there is no such instance.
    pub fn instance_coords(&self, index: u16, out: &mut [f32]) -> usize {
        let Some(instance) = self.instance(index) else {
            return 0;
        };
        for (slot, coord) in out.iter_mut().zip(instance.coordinates.iter()) {
            *slot = coord.to_f32();
        }
        self.axis_count() as usize
    }

    /// Add every name id still referenced after applying `limits` to `name_ids`.
    ///
    /// Names of pinned axes and of dropped instances are left out.
    pub fn collect_name_ids<S: BuildHasher>(
        &self,
        limits: &HashMap<Tag, AxisLimit, S>,
        name_ids: &mut U32Set,
    ) {
        let axes: Vec<_> = self.axes.iter().collect();
        for axis in &axes {
            if limits.get(&axis.axis_tag).is_some_and(AxisLimit::is_point) {
                continue;
            }
            name_ids.insert(axis.axis_name_id.to_u16() as u32);
        }
        for instance in self.instances() {
            if !instance.keep_instance(&axes, limits) {
                continue;
            }
            name_ids.insert(instance.subfamily_name_id.to_u16() as u32);
            if let Some(id) = instance.post_script_name_id {
                if id != NameId::UNSET {
                    name_ids.insert(id.to_u16() as u32);
                }
            }
        }
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}
