//! subsetter input parsing util functions
use std::collections::{BTreeMap, BTreeSet};

use font_types::Tag;
use read_fonts::collections::U32Set;

use crate::SubsetError;

/// The largest glyph id addressable through `maxp.numGlyphs`.
const MAX_GLYPH_ID: u32 = 0xFFFF;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InstancingSpec {
    pub pin_all_axes_to_default: bool,
    pub axes: BTreeMap<Tag, AxisSpec>,
}

/// What to do with one axis.
///
/// `NaN` in a range means "use the value from the font".
#[derive(Debug, Clone, PartialEq)]
pub enum AxisSpec {
    PinToDefault,
    Range { min: f32, def: f32, max: f32 },
}

/// Parse a comma separated list of glyph ids and inclusive `start-end` ranges.
///
/// `*` selects every glyph id a font can have.
pub fn populate_gids(gid_str: &str) -> Result<U32Set, SubsetError> {
    let mut result = U32Set::empty();
    if gid_str.trim() == "*" {
        result.insert_range(0..=MAX_GLYPH_ID);
        return Ok(result);
    }

    if gid_str.is_empty() {
        return Ok(result);
    }
    for gid in gid_str.split(',').map(str::trim) {
        if let Some((start, end)) = gid.split_once('-') {
            let start: u32 = start
                .parse::<u32>()
                .map_err(|_| SubsetError::InvalidGid(start.to_owned()))?;
            let end: u32 = end
                .parse::<u32>()
                .map_err(|_| SubsetError::InvalidGid(end.to_owned()))?;
            if start > end {
                return Err(SubsetError::InvalidGidRange { start, end });
            }
            result.insert_range(start..=end);
        } else {
            let glyph_id: u32 = gid
                .parse::<u32>()
                .map_err(|_| SubsetError::InvalidGid(gid.to_owned()))?;
            result.insert(glyph_id);
        }
    }
    Ok(result)
}

/// Parse a comma or whitespace list of things
fn parse_list<T: Ord>(
    input_str: &str,
    parse_one: fn(&str) -> Result<T, SubsetError>,
) -> Result<BTreeSet<T>, SubsetError> {
    input_str
        .split(&[',', ' '])
        .filter(|raw| !raw.is_empty())
        .map(parse_one)
        .collect()
}

//parse input tag list string, which is a comma/whitespace-separated list of table tags
pub fn parse_tag_list(input_str: &str) -> Result<BTreeSet<Tag>, SubsetError> {
    parse_list(input_str, |raw| {
        Tag::new_checked(raw.as_bytes()).map_err(|_| SubsetError::InvalidTag(raw.to_owned()))
    })
}

/// Parse a HarfBuzz-style instancing spec string, returning the parsed axis settings.
///
/// The input is a list of `tag=value` items: `wght=400` pins, `wght=300:700`
/// and `wght=300:400:700` restrict, `wght=drop` pins at the default and
/// `*=drop` pins every axis at its default. Empty range ends keep the font's
/// value.
pub fn parse_instancing_spec(input_str: &str) -> Result<InstancingSpec, SubsetError> {
    let mut spec = InstancingSpec::default();
    if input_str.trim().is_empty() {
        return Ok(spec);
    }

    for part in input_str
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|raw| !raw.is_empty())
    {
        let (raw_axis, raw_value) = part
            .split_once('=')
            .ok_or_else(|| SubsetError::InvalidInstancingSpec(part.to_owned()))?;

        if raw_axis == "*" {
            if raw_value != "drop" {
                return Err(SubsetError::InvalidInstancingSpec(raw_value.to_owned()));
            }
            spec.pin_all_axes_to_default = true;
            continue;
        }

        let axis_tag = parse_axis_tag(raw_axis)?;
        if raw_value == "drop" {
            spec.axes.insert(axis_tag, AxisSpec::PinToDefault);
            continue;
        }

        let (min, def, max) = parse_axis_range_from_string(raw_value)?;
        if min > max {
            return Err(SubsetError::InvalidInstancingSpec(raw_value.to_owned()));
        }
        spec.axes
            .insert(axis_tag, AxisSpec::Range { min, def, max });
    }

    Ok(spec)
}

fn parse_axis_tag(raw: &str) -> Result<Tag, SubsetError> {
    Tag::new_checked(raw.as_bytes()).map_err(|_| SubsetError::InvalidTag(raw.to_owned()))
}

fn parse_axis_range_from_string(raw: &str) -> Result<(f32, f32, f32), SubsetError> {
    let parts: Vec<&str> = raw.split(':').collect();
    match parts.as_slice() {
        [value] => {
            let value = parse_axis_value(value)?;
            Ok((value, value, value))
        }
        [min, max] => {
            let min = parse_axis_value_or_nan(min)?;
            let max = parse_axis_value_or_nan(max)?;
            Ok((min, f32::NAN, max))
        }
        [min, def, max] => {
            let min = parse_axis_value_or_nan(min)?;
            let def = parse_axis_value_or_nan(def)?;
            let max = parse_axis_value_or_nan(max)?;
            Ok((min, def, max))
        }
        _ => Err(SubsetError::InvalidInstancingSpec(raw.to_owned())),
    }
}

fn parse_axis_value(raw: &str) -> Result<f32, SubsetError> {
    raw.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SubsetError::InvalidInstancingSpec(raw.to_owned()))
}

fn parse_axis_value_or_nan(raw: &str) -> Result<f32, SubsetError> {
    if raw.is_empty() {
        return Ok(f32::NAN);
    }

    parse_axis_value(raw)
}

#[test]
fn test_populate_gids() {
    let input = "1,5,7";
    let output = populate_gids(input).unwrap();
    assert_eq!(output.len(), 3);
    assert!(output.contains(1));
    assert!(output.contains(5));
    assert!(output.contains(7));

    let output = populate_gids("2-4, 9").unwrap();
    assert_eq!(output.iter().collect::<Vec<_>>(), vec![2, 3, 4, 9]);

    let output = populate_gids("*").unwrap();
    assert!(output.contains(0));
    assert!(output.contains(7));
    assert!(output.contains(0xFFFF));
    assert!(!output.contains(0x10000));

    assert!(matches!(
        populate_gids("5-2"),
        Err(SubsetError::InvalidGidRange { start: 5, end: 2 })
    ));
    assert!(matches!(populate_gids("a"), Err(SubsetError::InvalidGid(_))));
}

#[test]
fn test_parse_drop_tables() {
    let input = "glyf,loca fvar";
    let output = parse_tag_list(input).unwrap();
    assert_eq!(output.len(), 3);
    assert!(output.contains(&Tag::new(b"glyf")));
    assert!(output.contains(&Tag::new(b"loca")));
    assert!(output.contains(&Tag::new(b"fvar")));

    let input = "";
    let output = parse_tag_list(input).unwrap();
    assert!(output.is_empty());
}

#[test]
fn test_parse_instancing_spec() {
    let spec = parse_instancing_spec("wght=400,wdth=75:100 opsz=:12: slnt=drop").unwrap();
    assert!(!spec.pin_all_axes_to_default);
    assert_eq!(
        spec.axes.get(&Tag::new(b"wght")),
        Some(&AxisSpec::Range {
            min: 400.0,
            def: 400.0,
            max: 400.0
        })
    );
    assert_eq!(
        spec.axes.get(&Tag::new(b"slnt")),
        Some(&AxisSpec::PinToDefault)
    );
    let Some(AxisSpec::Range { min, def, max }) = spec.axes.get(&Tag::new(b"wdth")) else {
        panic!("wdth should be a range");
    };
    assert_eq!((*min, *max), (75.0, 100.0));
    assert!(def.is_nan());
    let Some(AxisSpec::Range { min, def, max }) = spec.axes.get(&Tag::new(b"opsz")) else {
        panic!("opsz should be a range");
    };
    assert!(min.is_nan() && max.is_nan());
    assert_eq!(*def, 12.0);

    let spec = parse_instancing_spec("*=drop").unwrap();
    assert!(spec.pin_all_axes_to_default);
    assert!(spec.axes.is_empty());

    assert_eq!(parse_instancing_spec("  ").unwrap(), InstancingSpec::default());
}

#[test]
fn test_parse_axis_tag_padding() {
    let spec = parse_instancing_spec("ab=1").unwrap();
    assert!(spec.axes.contains_key(&Tag::new(b"ab  ")));
    assert!(matches!(
        parse_instancing_spec("toolong=1"),
        Err(SubsetError::InvalidTag(_))
    ));
}

#[test]
fn test_parse_instancing_spec_errors() {
    for bad in ["wght", "*=400", "wght=1:2:3:4", "wght=heavy", "wght=700:300", "wght=inf"] {
        assert!(
            matches!(
                parse_instancing_spec(bad),
                Err(SubsetError::InvalidInstancingSpec(_))
            ),
            "{bad}"
        );
    }
}
