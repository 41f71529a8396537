//! impl subset() for fvar table

use font_types::{Fixed, FixedSize, Tag};
use read_fonts::tables::fvar::{
    AxisRecord, Fvar, InstanceRecord, AXIS_RECORD_SIZE, FVAR_HEADER_LEN,
};

use crate::{
    serialize::{SerializeErrorFlags, Serializer},
    Plan, SubsetError,
};

pub const FVAR: Tag = Tag::new(b"fvar");

/// Write the fvar table for the retained axes and instances of `plan`.
///
/// Pinned axes are removed, restricted axes get their new range and named
/// instances that fall outside the new design space are dropped.
pub fn subset_fvar(fvar: &Fvar, plan: &Plan) -> Result<Vec<u8>, SubsetError> {
    if plan.axes_index_map.is_empty() {
        return Err(SubsetError::SubsetTableError(FVAR));
    }
    let mut s = Serializer::new();
    serialize_fvar(fvar, plan, &mut s).map_err(|e| {
        log::warn!("serializing fvar failed: {e:?}");
        SubsetError::SubsetTableError(FVAR)
    })?;
    s.copy_bytes()
        .map_err(|_| SubsetError::SubsetTableError(FVAR))
}

fn serialize_fvar(
    fvar: &Fvar,
    plan: &Plan,
    s: &mut Serializer,
) -> Result<(), SerializeErrorFlags> {
    let axes: Vec<AxisRecord> = fvar.axes().iter().collect();
    let new_axis_count = plan.axes_index_map.len();
    let has_psname = fvar.has_post_script_name_ids();

    // Version
    s.embed(1_u16)?;
    s.embed(0_u16)?;
    s.embed(FVAR_HEADER_LEN as u16)?; // Axes array offset
    s.embed(2_u16)?; // reserved
    let axis_count_pos = s.embed(0_u16)?;
    s.check_assign_u16(axis_count_pos, new_axis_count)?;
    s.embed(AXIS_RECORD_SIZE)?;
    let instance_count_pos = s.embed(0_u16)?;
    let instance_size = new_axis_count * Fixed::RAW_BYTE_LEN + if has_psname { 6 } else { 4 };
    let instance_size_pos = s.embed(0_u16)?;
    s.check_assign_u16(instance_size_pos, instance_size)?;

    for (ix, axis) in axes.iter().enumerate() {
        if !plan.axes_index_map.contains_key(&ix) {
            continue;
        }
        s.embed(axis.axis_tag)?;
        if let Some(limit) = plan.user_axes_location.get(&axis.axis_tag) {
            s.embed(Fixed::from_f64(limit.minimum))?;
            s.embed(Fixed::from_f64(limit.middle))?;
            s.embed(Fixed::from_f64(limit.maximum))?;
        } else {
            s.embed(axis.min_value)?;
            s.embed(axis.default_value)?;
            s.embed(axis.max_value)?;
        }
        s.embed(axis.flags)?;
        s.embed(axis.axis_name_id)?;
    }

    let mut instance_count = 0;
    for instance in fvar.instances() {
        if !instance.keep_instance(&axes, &plan.user_axes_location) {
            continue;
        }
        serialize_instance(&instance, &axes, plan, s)?;
        instance_count += 1;
    }
    s.check_assign_u16(instance_count_pos, instance_count)?;
    log::debug!(
        "fvar keeps {new_axis_count} of {} axes, {instance_count} of {} instances",
        axes.len(),
        fvar.instance_count()
    );
    Ok(())
}

fn serialize_instance(
    instance: &InstanceRecord,
    axes: &[AxisRecord],
    plan: &Plan,
    s: &mut Serializer,
) -> Result<(), SerializeErrorFlags> {
    s.embed(instance.subfamily_name_id)?;
    s.embed(instance.flags)?;
    for (ix, coord) in instance.coordinates.iter().enumerate() {
        let pinned = axes
            .get(ix)
            .and_then(|axis| plan.user_axes_location.get(&axis.axis_tag))
            .is_some_and(|limit| limit.is_point());
        if !pinned {
            s.embed(coord)?;
        }
    }
    if let Some(name_id) = instance.post_script_name_id {
        s.embed(name_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parse_instancing_spec, test_data::two_axis_fvar, FontTables, SubsetFlags};
    use font_types::NameId;
    use pretty_assertions::assert_eq;
    use read_fonts::{collections::U32Set, FontData, FontRead};

    fn subset_with(spec: Option<&str>) -> Result<Vec<u8>, SubsetError> {
        let data = two_axis_fvar();
        let font = FontTables::from_raw(None, None, false, Some(&data)).unwrap();
        let spec = spec.map(|s| parse_instancing_spec(s).unwrap());
        let plan = Plan::new(
            &U32Set::empty(),
            SubsetFlags::default(),
            spec.as_ref(),
            &font,
        )?;
        subset_fvar(font.fvar.as_ref().unwrap(), &plan)
    }

    #[test]
    fn no_instancing_keeps_everything() {
        let data = two_axis_fvar();
        let out = subset_with(None).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn pin_one_axis() {
        let out = subset_with(Some("wdth=100")).unwrap();
        let fvar = Fvar::read(FontData::new(&out)).unwrap();
        assert_eq!(fvar.axis_count(), 1);
        assert_eq!(fvar.instance_size(), 10);
        assert!(fvar.has_post_script_name_ids());
        let axis = fvar.axes().get(0).unwrap();
        assert_eq!(axis.axis_tag, Tag::new(b"wght"));
        assert_eq!(axis.max_value, Fixed::from_f64(900.0));
        // the condensed instance is not at the pinned width
        let names: Vec<_> = fvar.instances().map(|i| i.subfamily_name_id).collect();
        assert_eq!(names, vec![NameId::new(258), NameId::new(259)]);
        let black = fvar.instance(1).unwrap();
        assert_eq!(
            black.coordinates.iter().collect::<Vec<_>>(),
            vec![Fixed::from_f64(900.0)]
        );
        assert_eq!(black.post_script_name_id, Some(NameId::new(262)));
    }

    #[test]
    fn restrict_axis_range() {
        let out = subset_with(Some("wght=300:500")).unwrap();
        let fvar = Fvar::read(FontData::new(&out)).unwrap();
        assert_eq!(fvar.axis_count(), 2);
        let wght = fvar.axes().get(0).unwrap();
        assert_eq!(wght.min_value, Fixed::from_f64(300.0));
        assert_eq!(wght.default_value, Fixed::from_f64(400.0));
        assert_eq!(wght.max_value, Fixed::from_f64(500.0));
        let wdth = fvar.axes().get(1).unwrap();
        assert_eq!(wdth.min_value, Fixed::from_f64(50.0));
        // Black at 900 is outside the new range
        assert_eq!(fvar.instance_count(), 2);
        assert_eq!(
            fvar.instance_post_script_name_id(1),
            Some(NameId::UNSET)
        );
    }

    #[test]
    fn pinning_every_axis_fails() {
        assert!(matches!(
            subset_with(Some("wght=drop,wdth=drop")),
            Err(SubsetError::SubsetTableError(tag)) if tag == FVAR
        ));
    }
}
