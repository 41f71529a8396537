//! Applying cursive attachment and pair kerning.

use read_fonts::tables::gpos::{CursivePosFormat1, PairPosFormat2, ValueFormat, ValueRecord};

use crate::apply::{ApplyContext, SkippingIterator, MAX_NESTING_LEVEL};
use crate::buffer::{AttachType, Direction, GlyphPosition};
use crate::face::PositionSubtable;

pub(crate) fn apply_position_subtable(ctx: &mut ApplyContext, subtable: &PositionSubtable) -> bool {
    match subtable {
        PositionSubtable::Cursive(table) => apply_cursive(ctx, table),
        PositionSubtable::Pair(table) => apply_pair_format2(ctx, table),
    }
}

/// Add the values of `record` to `pos`.
///
/// Only the advance along `direction` is used. Returns `true` if anything
/// non-zero was added.
pub(crate) fn apply_value(record: &ValueRecord, direction: Direction, pos: &mut GlyphPosition) -> bool {
    let format = record.format;
    let mut applied = false;
    if format.contains(ValueFormat::X_PLACEMENT) {
        pos.x_offset += record.x_placement as i32;
        applied |= record.x_placement != 0;
    }
    if format.contains(ValueFormat::Y_PLACEMENT) {
        pos.y_offset += record.y_placement as i32;
        applied |= record.y_placement != 0;
    }
    if format.contains(ValueFormat::X_ADVANCE) {
        if direction.is_horizontal() {
            pos.x_advance += record.x_advance as i32;
        }
        applied |= record.x_advance != 0;
    }
    if format.contains(ValueFormat::Y_ADVANCE) {
        // font y grows up, layout y advances grow down
        if direction.is_vertical() {
            pos.y_advance -= record.y_advance as i32;
        }
        applied |= record.y_advance != 0;
    }
    applied
}

/// Kern the glyph at the cursor against the next glyph by class.
///
/// Returns `true` whenever there is a next glyph to pair with, whether or
/// not the pair had any adjustment, and moves the cursor to it (or past it
/// if the second glyph was adjusted too).
pub(crate) fn apply_pair_format2(ctx: &mut ApplyContext, table: &PairPosFormat2) -> bool {
    let first_glyph = ctx.buffer.cur().glyph_id;
    if table.coverage().get(first_glyph).is_none() {
        return false;
    }
    let (second, unsafe_to) = {
        let mut iter = SkippingIterator::new(ctx, ctx.buffer.idx, 1);
        let mut unsafe_to = 0;
        let found = iter.next(Some(&mut unsafe_to));
        (found.then_some(iter.idx), unsafe_to)
    };
    let idx = ctx.buffer.idx;
    let Some(second) = second else {
        ctx.buffer.unsafe_to_concat(idx, unsafe_to);
        return false;
    };

    let class1 = table.class_def1().get(first_glyph);
    let class2 = table.class_def2().get(ctx.buffer.info[second].glyph_id);
    let Some((value1, value2)) = table.record(class1, class2) else {
        ctx.buffer.unsafe_to_concat(idx, second + 1);
        return false;
    };

    let len2 = table.value_format2().field_count();
    let direction = ctx.direction;
    let applied = match split_kern(ctx, &value1, len2, second) {
        Some(applied) => applied,
        None => {
            let applied1 = apply_value(&value1, direction, &mut ctx.buffer.pos[idx]);
            let applied2 =
                len2 != 0 && apply_value(&value2, direction, &mut ctx.buffer.pos[second]);
            applied1 || applied2
        }
    };
    if applied {
        ctx.buffer.unsafe_to_break(idx, second + 1);
    } else {
        ctx.buffer.unsafe_to_concat(idx, second + 1);
    }

    let mut next = second;
    if len2 != 0 {
        next += 1;
        ctx.buffer.unsafe_to_break(idx, next + 1);
    }
    ctx.buffer.idx = next;
    true
}

/// Split a plain advance adjustment evenly between the two glyphs.
///
/// Only done when enabled and the first value is nothing but an advance
/// (plus the placement in backward text); returns `None` to apply the
/// values as they are.
fn split_kern(ctx: &mut ApplyContext, value1: &ValueRecord, len2: usize, second: usize) -> Option<bool> {
    if !ctx.split_kerning || len2 != 0 {
        return None;
    }
    let direction = ctx.direction;
    let horizontal = direction.is_horizontal();
    let mut mask = if horizontal {
        ValueFormat::X_ADVANCE.bits()
    } else {
        ValueFormat::Y_ADVANCE.bits()
    };
    if direction.is_backward() {
        // the matching placement
        mask |= mask >> 2;
    }
    // and the device tables for each
    mask |= mask << 4;
    if value1.format.bits() & !mask != 0 {
        return None;
    }

    let mut src = GlyphPosition::default();
    if !apply_value(value1, direction, &mut src) {
        return Some(false);
    }
    let (kern, src_offset) = if horizontal {
        (src.x_advance, src.x_offset)
    } else {
        (src.y_advance, src.y_offset)
    };
    let kern1 = kern >> 1;
    let kern2 = kern - kern1;
    let idx = ctx.buffer.idx;
    let forward = direction.is_forward();
    let pos = &mut ctx.buffer.pos;
    let (advance1, offset1) = main_axis(&mut pos[idx], horizontal);
    *advance1 += kern1;
    if !forward {
        *offset1 += src_offset - kern2;
    }
    let (advance2, offset2) = main_axis(&mut pos[second], horizontal);
    *advance2 += kern2;
    if forward {
        *offset2 += kern2;
    }
    Some(kern != 0)
}

fn main_axis(pos: &mut GlyphPosition, horizontal: bool) -> (&mut i32, &mut i32) {
    if horizontal {
        (&mut pos.x_advance, &mut pos.x_offset)
    } else {
        (&mut pos.y_advance, &mut pos.y_offset)
    }
}

fn cross_axis_offset(pos: &mut GlyphPosition, direction: Direction) -> &mut i32 {
    if direction.is_horizontal() {
        &mut pos.y_offset
    } else {
        &mut pos.x_offset
    }
}

/// Join the entry anchor of the glyph at the cursor to the exit anchor of
/// the previous glyph.
///
/// Advances are adjusted so the anchors meet along the text direction; the
/// cross-stream offset is recorded on the child of the attachment, which is
/// the later glyph unless the lookup is flagged right-to-left.
pub(crate) fn apply_cursive(ctx: &mut ApplyContext, table: &CursivePosFormat1) -> bool {
    let this_glyph = ctx.buffer.cur().glyph_id;
    let Some((Some(entry), _)) = table.anchors(this_glyph) else {
        return false;
    };

    let (prev, unsafe_from) = {
        let mut iter = SkippingIterator::new(ctx, ctx.buffer.idx, 1);
        let mut unsafe_from = 0;
        let found = iter.prev(Some(&mut unsafe_from));
        (found.then_some(iter.idx), unsafe_from)
    };
    let j = ctx.buffer.idx;
    let Some(i) = prev else {
        ctx.buffer.unsafe_to_concat(unsafe_from, j + 1);
        return false;
    };
    let Some((_, Some(exit))) = table.anchors(ctx.buffer.info[i].glyph_id) else {
        ctx.buffer.unsafe_to_concat(i, j + 1);
        return false;
    };
    ctx.buffer.unsafe_to_break(i, j + 1);

    let (exit_x, exit_y) = (exit.x as i32, exit.y as i32);
    let (entry_x, entry_y) = (entry.x as i32, entry.y as i32);
    let direction = ctx.direction;
    let pos = &mut ctx.buffer.pos;
    match direction {
        Direction::LeftToRight => {
            pos[i].x_advance = exit_x + pos[i].x_offset;
            let d = entry_x + pos[j].x_offset;
            pos[j].x_advance -= d;
            pos[j].x_offset -= d;
        }
        Direction::RightToLeft => {
            let d = exit_x + pos[i].x_offset;
            pos[i].x_advance -= d;
            pos[i].x_offset -= d;
            pos[j].x_advance = entry_x + pos[j].x_offset;
        }
        Direction::TopToBottom => {
            pos[i].y_advance = exit_y + pos[i].y_offset;
            let d = entry_y + pos[j].y_offset;
            pos[j].y_advance -= d;
            pos[j].y_offset -= d;
        }
        Direction::BottomToTop => {
            let d = exit_y + pos[i].y_offset;
            pos[i].y_advance -= d;
            pos[i].y_offset -= d;
            pos[j].y_advance = entry_y;
        }
    }

    let (mut child, mut parent) = (i, j);
    let mut x_offset = entry_x - exit_x;
    let mut y_offset = entry_y - exit_y;
    if !ctx.lookup_flag.right_to_left() {
        std::mem::swap(&mut child, &mut parent);
        x_offset = -x_offset;
        y_offset = -y_offset;
    }

    // The child's old chain now hangs off the new parent, so it is flipped
    // to point back down towards the child.
    reverse_cursive_minor_offset(pos, child, direction, parent);

    pos[child].attach_type = AttachType::Cursive;
    pos[child].attach_parent = Some(parent);
    *cross_axis_offset(&mut pos[child], direction) = if direction.is_horizontal() {
        y_offset
    } else {
        x_offset
    };

    // a parent attached to its own child is detached
    if pos[parent].attach_parent == Some(child) {
        pos[parent].attach_parent = None;
        *cross_axis_offset(&mut pos[parent], direction) = 0;
    }

    ctx.buffer.has_attachments = true;
    ctx.buffer.idx += 1;
    true
}

/// Reverse the cursive chain that starts at `start`, stopping at
/// `new_parent`.
///
/// Every link in the chain is turned around and its cross-stream offset
/// negated, so the whole chain can be re-rooted at `start`.
pub(crate) fn reverse_cursive_minor_offset(
    positions: &mut [GlyphPosition],
    start: usize,
    direction: Direction,
    new_parent: usize,
) {
    let mut links = Vec::new();
    let mut node = start;
    while links.len() < positions.len() {
        let pos = &mut positions[node];
        let Some(parent) = pos.attach_parent.filter(|_| pos.attach_type == AttachType::Cursive)
        else {
            break;
        };
        pos.attach_parent = None;
        if parent == new_parent || parent >= positions.len() {
            break;
        }
        links.push((node, parent));
        node = parent;
    }
    // the far end first, so each offset is read before it is overwritten
    for &(child, parent) in links.iter().rev() {
        let offset = -*cross_axis_offset(&mut positions[child], direction);
        let pos = &mut positions[parent];
        *cross_axis_offset(pos, direction) = offset;
        pos.attach_parent = Some(child);
        pos.attach_type = AttachType::Cursive;
    }
}

/// Turn attachment offsets, which are relative to the parent glyph, into
/// offsets relative to the glyph's own pen position.
///
/// Attachment parents are left in place for callers that want them.
pub fn propagate_attachment_offsets(positions: &mut [GlyphPosition], direction: Direction) {
    let len = positions.len();
    let mut resolved = vec![false; len];
    let mut chain = Vec::new();
    for start in 0..len {
        chain.clear();
        let mut i = start;
        // walk up to the first resolved ancestor; a cycle stops here too
        while !resolved[i] && chain.len() < MAX_NESTING_LEVEL {
            resolved[i] = true;
            match positions[i].attach_parent {
                Some(parent) if parent < len && positions[i].attach_type != AttachType::None => {
                    chain.push((i, parent));
                    i = parent;
                }
                _ => break,
            }
        }
        for &(child, parent) in chain.iter().rev() {
            apply_parent_offset(positions, child, parent, direction);
        }
    }
}

fn apply_parent_offset(positions: &mut [GlyphPosition], i: usize, j: usize, direction: Direction) {
    let parent = positions[j];
    match positions[i].attach_type {
        AttachType::Cursive => {
            if direction.is_horizontal() {
                positions[i].y_offset += parent.y_offset;
            } else {
                positions[i].x_offset += parent.x_offset;
            }
        }
        AttachType::Mark => {
            let (mut dx, mut dy) = (parent.x_offset, parent.y_offset);
            if j < i && direction.is_forward() {
                for pos in &positions[j..i] {
                    dx -= pos.x_advance;
                    dy -= pos.y_advance;
                }
            } else if j < i {
                for pos in &positions[j + 1..=i] {
                    dx += pos.x_advance;
                    dy += pos.y_advance;
                }
            }
            positions[i].x_offset += dx;
            positions[i].y_offset += dy;
        }
        AttachType::None => (),
    }
}
