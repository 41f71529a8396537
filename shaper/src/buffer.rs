//! The glyph buffer shaping operates on.

use font_types::GlyphId;

use crate::myanmar;

/// Flags reported on output glyphs.
pub mod glyph_flag {
    /// Breaking the text at the start of this glyph's cluster and shaping
    /// the two sides separately may give a different result.
    pub const UNSAFE_TO_BREAK: u32 = 0x0000_0001;
    /// Changing the text on one side of the start of this glyph's cluster
    /// may change the shaping result on the other side.
    ///
    /// Implied by [`UNSAFE_TO_BREAK`].
    pub const UNSAFE_TO_CONCAT: u32 = 0x0000_0002;
    /// All the currently defined flags.
    pub const DEFINED: u32 = 0x0000_0003;
}

/// Glyph properties derived from the glyph class and from substitutions.
pub(crate) mod glyph_props {
    pub const BASE_GLYPH: u16 = 0x0002;
    pub const LIGATURE: u16 = 0x0004;
    pub const MARK: u16 = 0x0008;
    /// The lookup flag bits that skip the three classes above.
    pub const CLASS_MASK: u16 = BASE_GLYPH | LIGATURE | MARK;

    pub const SUBSTITUTED: u16 = 0x0010;
    pub const LIGATED: u16 = 0x0020;
    pub const MULTIPLIED: u16 = 0x0040;
    /// Bits that survive a change of glyph class.
    pub const PRESERVE: u16 = SUBSTITUTED | LIGATED | MULTIPLIED;

    /// Mark attachment class, in the high byte as in a lookup flag.
    pub const MARK_ATTACHMENT_CLASS: u16 = 0xff00;
}

const IS_LIG_BASE: u8 = 0x10;

/// Text direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::RightToLeft)
    }

    pub fn is_vertical(self) -> bool {
        !self.is_horizontal()
    }

    /// `true` for the directions glyphs are stored in.
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::TopToBottom)
    }

    pub fn is_backward(self) -> bool {
        !self.is_forward()
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::LeftToRight => Direction::RightToLeft,
            Direction::RightToLeft => Direction::LeftToRight,
            Direction::TopToBottom => Direction::BottomToTop,
            Direction::BottomToTop => Direction::TopToBottom,
        }
    }
}

/// How a glyph is attached to its [`attach_parent`](GlyphPosition::attach_parent).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AttachType {
    #[default]
    None,
    /// The glyph's offset is relative to its parent's origin.
    Mark,
    /// Only the cross-stream offset follows the parent.
    Cursive,
}

/// A glyph and the text it came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphInfo {
    pub glyph_id: GlyphId,
    /// The character this glyph was mapped from, or the first character of
    /// the run it replaced.
    pub codepoint: u32,
    /// Index of the first character of the cluster in the input text.
    pub cluster: u32,
    /// Output flags, see [`glyph_flag`].
    pub mask: u32,
    pub(crate) glyph_props: u16,
    pub(crate) lig_props: u8,
    pub(crate) syllable: u8,
    pub(crate) myanmar_category: myanmar::Category,
    pub(crate) myanmar_position: myanmar::Position,
}

impl GlyphInfo {
    pub fn new(codepoint: u32, cluster: u32) -> Self {
        GlyphInfo {
            codepoint,
            cluster,
            ..Default::default()
        }
    }

    pub fn unsafe_to_break(&self) -> bool {
        self.mask & glyph_flag::UNSAFE_TO_BREAK != 0
    }

    pub fn unsafe_to_concat(&self) -> bool {
        self.mask & glyph_flag::UNSAFE_TO_CONCAT != 0
    }

    /// `true` if this glyph was produced by a ligature substitution.
    ///
    /// Single glyph replacements, including one-component ligatures, do not
    /// count.
    pub fn is_ligated(&self) -> bool {
        self.glyph_props & glyph_props::LIGATED != 0
    }

    /// `true` if any substitution touched this glyph.
    pub fn is_substituted(&self) -> bool {
        self.glyph_props & glyph_props::SUBSTITUTED != 0
    }

    pub fn is_base_glyph(&self) -> bool {
        self.glyph_props & glyph_props::BASE_GLYPH != 0
    }

    pub fn is_ligature(&self) -> bool {
        self.glyph_props & glyph_props::LIGATURE != 0
    }

    pub fn is_mark(&self) -> bool {
        self.glyph_props & glyph_props::MARK != 0
    }

    pub(crate) fn is_multiplied(&self) -> bool {
        self.glyph_props & glyph_props::MULTIPLIED != 0
    }

    /// The syllable serial and type assigned by the Myanmar segmenter.
    pub fn syllable(&self) -> u8 {
        self.syllable
    }

    // A ligature glyph and the marks that were between its components share
    // a ligature id. The ligature records how many components it has; each
    // mark records which component it followed.

    pub(crate) fn lig_id(&self) -> u8 {
        self.lig_props >> 5
    }

    fn is_ligated_internal(&self) -> bool {
        self.lig_props & IS_LIG_BASE != 0
    }

    pub(crate) fn lig_comp(&self) -> u8 {
        if self.is_ligated_internal() {
            0
        } else {
            self.lig_props & 0x0f
        }
    }

    pub(crate) fn lig_num_comps(&self) -> u8 {
        if self.is_ligature() && self.is_ligated_internal() {
            self.lig_props & 0x0f
        } else {
            1
        }
    }

    pub(crate) fn set_lig_props_for_ligature(&mut self, lig_id: u8, lig_num_comps: u8) {
        self.lig_props = (lig_id << 5) | IS_LIG_BASE | (lig_num_comps & 0x0f);
    }

    pub(crate) fn set_lig_props_for_mark(&mut self, lig_id: u8, lig_comp: u8) {
        self.lig_props = (lig_id << 5) | (lig_comp & 0x0f);
    }
}

/// Where a glyph goes relative to the pen position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphPosition {
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub attach_type: AttachType,
    /// The glyph this one is positioned against, if any.
    ///
    /// Attachment forms a forest over the buffer; offsets are made absolute
    /// by [`propagate_attachment_offsets`](crate::propagate_attachment_offsets).
    pub attach_parent: Option<usize>,
}

/// A run of glyphs being shaped.
///
/// Lookups edit the buffer in place; `idx` is the glyph the current lookup
/// is trying to match at.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    pub(crate) direction: Direction,
    pub(crate) info: Vec<GlyphInfo>,
    pub(crate) pos: Vec<GlyphPosition>,
    pub(crate) idx: usize,
    pub(crate) has_attachments: bool,
    pub(crate) has_broken_syllables: bool,
    serial: u8,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every character of `text`, with clusters counted in characters.
    pub fn push_str(&mut self, text: &str) {
        let start = self.info.len() as u32;
        for (i, ch) in text.chars().enumerate() {
            self.add(ch as u32, start + i as u32);
        }
    }

    pub fn add(&mut self, codepoint: u32, cluster: u32) {
        self.info.push(GlyphInfo::new(codepoint, cluster));
        self.pos.push(GlyphPosition::default());
    }

    pub fn len(&self) -> usize {
        self.info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn glyph_infos(&self) -> &[GlyphInfo] {
        &self.info
    }

    pub fn glyph_positions(&self) -> &[GlyphPosition] {
        &self.pos
    }

    pub fn glyph_positions_mut(&mut self) -> &mut [GlyphPosition] {
        &mut self.pos
    }

    pub(crate) fn cur(&self) -> &GlyphInfo {
        &self.info[self.idx]
    }

    pub(crate) fn cur_mut(&mut self) -> &mut GlyphInfo {
        &mut self.info[self.idx]
    }

    pub(crate) fn clear_positions(&mut self) {
        self.pos.clear();
        self.pos.resize(self.info.len(), GlyphPosition::default());
    }

    pub(crate) fn allocate_lig_id(&mut self) -> u8 {
        // three bits; zero means "no ligature"
        self.serial = self.serial.wrapping_add(1) & 0x07;
        if self.serial == 0 {
            self.serial = 1;
        }
        self.serial
    }

    pub(crate) fn insert(&mut self, index: usize, info: GlyphInfo) {
        self.info.insert(index, info);
        self.pos.insert(index, GlyphPosition::default());
    }

    pub(crate) fn remove(&mut self, index: usize) -> GlyphInfo {
        self.pos.remove(index);
        self.info.remove(index)
    }

    pub fn reverse(&mut self) {
        let len = self.len();
        self.reverse_range(0, len);
    }

    /// Reverse the glyphs in `start..end`.
    pub fn reverse_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.len());
        if start >= end {
            return;
        }
        self.info[start..end].reverse();
        self.pos[start..end].reverse();
    }

    /// Give every glyph in `start..end` the smallest cluster value among
    /// them, growing the range to swallow whole clusters at both ends.
    pub fn merge_clusters(&mut self, start: usize, end: usize) {
        let end = end.min(self.len());
        if end.saturating_sub(start) < 2 {
            return;
        }
        let Some(cluster) = self.info[start..end].iter().map(|i| i.cluster).min() else {
            return;
        };

        let mut end = end;
        while end < self.len() && self.info[end - 1].cluster == self.info[end].cluster {
            end += 1;
        }
        let mut start = start;
        while start > 0 && self.info[start - 1].cluster == self.info[start].cluster {
            start -= 1;
        }

        for info in &mut self.info[start..end] {
            set_cluster(info, cluster, 0);
        }
    }

    /// Mark `start..end` as unsafe to break, except for glyphs in the
    /// cluster the range starts with.
    pub fn unsafe_to_break(&mut self, start: usize, end: usize) {
        self.set_interior_flags(
            glyph_flag::UNSAFE_TO_BREAK | glyph_flag::UNSAFE_TO_CONCAT,
            start,
            end,
        );
    }

    pub fn unsafe_to_concat(&mut self, start: usize, end: usize) {
        self.set_interior_flags(glyph_flag::UNSAFE_TO_CONCAT, start, end);
    }

    fn set_interior_flags(&mut self, mask: u32, start: usize, end: usize) {
        let end = end.min(self.len());
        if end.saturating_sub(start) < 2 {
            return;
        }
        let Some(cluster) = self.info[start..end].iter().map(|i| i.cluster).min() else {
            return;
        };
        for info in &mut self.info[start..end] {
            if info.cluster != cluster {
                info.mask |= mask;
            }
        }
    }

    /// Stable insertion sort of `start..end` by `key`.
    ///
    /// Every glyph that moves has its cluster merged with the glyphs it
    /// jumped over. Only valid before positioning.
    pub fn sort<K: Ord>(&mut self, start: usize, end: usize, key: impl Fn(&GlyphInfo) -> K) {
        let end = end.min(self.len());
        for i in start + 1..end {
            let mut j = i;
            while j > start && key(&self.info[j - 1]) > key(&self.info[i]) {
                j -= 1;
            }
            if i == j {
                continue;
            }
            self.merge_clusters(j, i + 1);
            let moved = self.info[i];
            self.info.copy_within(j..i, j + 1);
            self.info[j] = moved;
        }
    }

    /// The index one past the syllable starting at `start`.
    pub fn next_syllable(&self, start: usize) -> usize {
        let Some(syllable) = self.info.get(start).map(|i| i.syllable) else {
            return start;
        };
        let mut end = start + 1;
        while end < self.len() && self.info[end].syllable == syllable {
            end += 1;
        }
        end
    }
}

fn set_cluster(info: &mut GlyphInfo, cluster: u32, mask: u32) {
    if info.cluster != cluster {
        info.mask = (info.mask & !glyph_flag::DEFINED) | (mask & glyph_flag::DEFINED);
    }
    info.cluster = cluster;
}

/// The result of shaping.
#[derive(Clone, Debug, Default)]
pub struct GlyphBuffer(pub(crate) Buffer);

impl GlyphBuffer {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.0.direction
    }

    /// Glyphs in visual order.
    pub fn glyph_infos(&self) -> &[GlyphInfo] {
        &self.0.info
    }

    pub fn glyph_positions(&self) -> &[GlyphPosition] {
        &self.0.pos
    }

    /// Sum of the advances along the direction of the text.
    pub fn advance(&self) -> i32 {
        if self.0.direction.is_horizontal() {
            self.0.pos.iter().map(|p| p.x_advance).sum()
        } else {
            self.0.pos.iter().map(|p| p.y_advance).sum()
        }
    }

    pub fn into_buffer(self) -> Buffer {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clusters(buffer: &Buffer) -> Vec<u32> {
        buffer.info.iter().map(|i| i.cluster).collect()
    }

    #[test]
    fn push_str_counts_chars() {
        let mut buffer = Buffer::new();
        buffer.push_str("aé");
        buffer.push_str("b");
        assert_eq!(clusters(&buffer), vec![0, 1, 2]);
        assert_eq!(buffer.info[1].codepoint, 'é' as u32);
        assert_eq!(buffer.pos.len(), 3);
    }

    #[test]
    fn merge_clusters_extends_to_whole_clusters() {
        let mut buffer = Buffer::new();
        for cluster in [0, 1, 1, 2, 3, 3] {
            buffer.add('x' as u32, cluster);
        }
        buffer.merge_clusters(2, 4);
        assert_eq!(clusters(&buffer), vec![0, 1, 1, 1, 3, 3]);
        buffer.merge_clusters(3, 5);
        assert_eq!(clusters(&buffer), vec![0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn unsafe_to_break_skips_first_cluster() {
        let mut buffer = Buffer::new();
        for cluster in [0, 0, 1, 2] {
            buffer.add('x' as u32, cluster);
        }
        buffer.unsafe_to_break(0, 3);
        let flags: Vec<_> = buffer.info.iter().map(|i| i.unsafe_to_break()).collect();
        assert_eq!(flags, vec![false, false, true, false]);
        assert!(buffer.info[2].unsafe_to_concat());
    }

    #[test]
    fn sort_is_stable_and_merges() {
        let mut buffer = Buffer::new();
        for (cluster, cp) in [(0, 3u32), (1, 1), (2, 3), (3, 0)] {
            buffer.add(cp, cluster);
        }
        buffer.sort(0, 4, |info| info.codepoint);
        let cps: Vec<_> = buffer.info.iter().map(|i| i.codepoint).collect();
        assert_eq!(cps, vec![0, 1, 3, 3]);
        // everything moved past the first glyph, so it is all one cluster
        assert_eq!(clusters(&buffer), vec![0, 0, 0, 0]);
    }

    #[test]
    fn sort_leaves_ordered_runs_alone() {
        let mut buffer = Buffer::new();
        for cluster in 0..3 {
            buffer.add(cluster, cluster);
        }
        buffer.sort(0, 3, |info| info.codepoint);
        assert_eq!(clusters(&buffer), vec![0, 1, 2]);
    }

    #[test]
    fn lig_ids_skip_zero() {
        let mut buffer = Buffer::new();
        let ids: Vec<_> = (0..9).map(|_| buffer.allocate_lig_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 1, 2]);
    }

    #[test]
    fn lig_props() {
        let mut info = GlyphInfo::new(0, 0);
        info.glyph_props = glyph_props::LIGATURE;
        info.set_lig_props_for_ligature(3, 2);
        assert_eq!(info.lig_id(), 3);
        assert_eq!(info.lig_num_comps(), 2);
        assert_eq!(info.lig_comp(), 0);
        let mut mark = GlyphInfo::new(0, 0);
        mark.set_lig_props_for_mark(3, 1);
        assert_eq!((mark.lig_id(), mark.lig_comp(), mark.lig_num_comps()), (3, 1, 1));
    }

    #[test]
    fn syllables() {
        let mut buffer = Buffer::new();
        for syllable in [1, 1, 2, 3, 3, 3] {
            buffer.add(0, 0);
            buffer.info.last_mut().unwrap().syllable = syllable;
        }
        assert_eq!(buffer.next_syllable(0), 2);
        assert_eq!(buffer.next_syllable(2), 3);
        assert_eq!(buffer.next_syllable(3), 6);
        assert_eq!(buffer.next_syllable(6), 6);
    }
}
