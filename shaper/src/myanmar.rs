//! Myanmar syllable segmentation and reordering.
//!
//! Characters are classified into [`Category`]s, the run is split into
//! syllables, broken syllables get a dotted circle as a stand-in base, and
//! every consonant syllable is put into visual order by [`Position`].

use log::trace;

use crate::buffer::{Buffer, GlyphInfo};
use crate::face::Face;

/// The codepoint inserted as the base of a broken syllable.
pub const DOTTED_CIRCLE: u32 = 0x25CC;

/// The shaping class of a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Category {
    /// Not part of the script.
    #[default]
    X,
    /// Consonant.
    C,
    /// Independent vowel.
    IV,
    /// Virama (stacking).
    H,
    Zwnj,
    Zwj,
    /// Visarga and tone marks.
    SM,
    /// Anusvara.
    A,
    DottedCircle,
    Ra,
    /// Consonant with stacker.
    CS,
    VBlw,
    VPre,
    VPst,
    VAbv,
    /// Asat.
    As,
    /// Medial ha.
    MH,
    /// Medial ra.
    MR,
    /// Medial wa and Shan medial wa.
    MW,
    /// Medial ya and Mon medials.
    MY,
    /// Pwo and other tones.
    PT,
    /// Variation selector.
    VS,
    /// Punctuation.
    P,
    /// Generic base: digits and placeholders such as NBSP.
    GB,
    /// Medial la.
    ML,
    /// Dot below.
    DB,
}

impl Category {
    /// Classify a codepoint.
    pub fn of(c: u32) -> Category {
        use Category::*;
        match c {
            0x101B => Ra,
            0x1000..=0x1020 => C,
            0x1021..=0x102A => IV,
            0x102B | 0x102C => VPst,
            0x102D | 0x102E => VAbv,
            0x102F | 0x1030 => VBlw,
            0x1031 => VPre,
            0x1032..=0x1035 => VAbv,
            0x1036 => A,
            0x1037 => DB,
            0x1038 => SM,
            0x1039 => H,
            0x103A => As,
            0x103B => MY,
            0x103C => MR,
            0x103D => MW,
            0x103E => MH,
            0x103F => C,
            0x1040..=0x1049 => GB,
            0x104A | 0x104B => P,
            0x104E => C,
            0x1050 | 0x1051 => C,
            0x1052..=0x1055 => IV,
            0x1056 | 0x1057 => VPst,
            0x1058 | 0x1059 => VBlw,
            0x105A..=0x105D => C,
            0x105E | 0x105F => MY,
            0x1060 => ML,
            0x1061 => C,
            0x1062 => VPst,
            0x1063 | 0x1064 => PT,
            0x1065 | 0x1066 => C,
            0x1067 | 0x1068 => VPst,
            0x1069..=0x106D => PT,
            0x106E..=0x1070 => C,
            0x1071..=0x1074 => VAbv,
            0x1075..=0x1081 => C,
            0x1082 => MW,
            0x1083 => VPst,
            0x1084 => VPre,
            0x1085 | 0x1086 => VAbv,
            0x1087..=0x108C => PT,
            0x108D => DB,
            0x108E => C,
            0x108F => PT,
            0x1090..=0x1099 => GB,
            0x109A | 0x109B => PT,
            0x109C => VPst,
            0x109D => VAbv,
            0xA9E0..=0xA9E4 => C,
            0xA9E5 => VAbv,
            0xA9E7..=0xA9EF => C,
            0xA9F0..=0xA9F9 => GB,
            0xA9FA..=0xA9FE => C,
            0xAA60..=0xAA76 => C,
            0xAA7A => C,
            0xAA7B | 0xAA7D => PT,
            0xAA7C => VAbv,
            0xAA7E | 0xAA7F => C,
            0x200C => Zwnj,
            0x200D => Zwj,
            DOTTED_CIRCLE => DottedCircle,
            0x00A0 | 0x00D7 | 0x2012..=0x2015 | 0x2022 | 0x25FB..=0x25FE => GB,
            0xFE00..=0xFE0F => VS,
            _ => X,
        }
    }

    fn is_consonant(self) -> bool {
        use Category::*;
        matches!(self, C | CS | Ra | IV | GB | DottedCircle)
    }
}

/// Returns `true` if `c` is in one of the Myanmar blocks.
pub fn is_myanmar(c: u32) -> bool {
    matches!(c, 0x1000..=0x109F | 0xA9E0..=0xA9FF | 0xAA60..=0xAA7F)
}

/// Where a glyph goes in its syllable; syllables are sorted by this.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    #[default]
    Start,
    RaToBecomeReph,
    PreM,
    PreC,
    BaseC,
    AfterMain,
    AboveC,
    BeforeSub,
    BelowC,
    AfterSub,
    BeforePost,
    PostC,
    AfterPost,
    Smvd,
    End,
}

/// The kind of syllable, stored in the low bits of [`GlyphInfo::syllable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SyllableType {
    Consonant = 0,
    Punctuation = 1,
    Broken = 2,
    NonMyanmar = 3,
}

impl SyllableType {
    pub fn of(info: &GlyphInfo) -> SyllableType {
        match info.syllable & 0x0f {
            0 => SyllableType::Consonant,
            1 => SyllableType::Punctuation,
            2 => SyllableType::Broken,
            _ => SyllableType::NonMyanmar,
        }
    }
}

/// Assign a category to every glyph.
pub(crate) fn setup_categories(buffer: &mut Buffer) {
    for info in &mut buffer.info {
        info.myanmar_category = Category::of(info.codepoint);
        info.myanmar_position = Position::End;
    }
}

/// Mark every glyph with the serial and type of the syllable it is in.
///
/// Returns `true` if any syllable was broken.
pub(crate) fn find_syllables(buffer: &mut Buffer) -> bool {
    let categories: Vec<Category> = buffer.info.iter().map(|i| i.myanmar_category).collect();
    let mut serial = 1u8;
    let mut start = 0;
    let mut has_broken = false;
    while start < categories.len() {
        let (len, kind) = match_syllable(&categories[start..]);
        has_broken |= kind == SyllableType::Broken;
        let syllable = (serial << 4) | kind as u8;
        for info in &mut buffer.info[start..start + len] {
            info.syllable = syllable;
        }
        trace!("syllable {start}..{} is {kind:?}", start + len);
        start += len;
        serial += 1;
        if serial == 16 {
            serial = 1;
        }
    }
    buffer.has_broken_syllables = has_broken;
    has_broken
}

/// The length and type of the syllable at the start of `cats`.
///
/// Takes the longest of the candidate matches; ties go to the candidate
/// listed first.
fn match_syllable(cats: &[Category]) -> (usize, SyllableType) {
    debug_assert!(!cats.is_empty());
    let mut best = (1, SyllableType::NonMyanmar);
    let candidates = [
        (consonant_syllable(cats), SyllableType::Consonant),
        (joiner(cats), SyllableType::NonMyanmar),
        (punctuation_cluster(cats), SyllableType::Punctuation),
        (broken_cluster(cats), SyllableType::Broken),
    ];
    let mut best_len = 0;
    for (len, kind) in candidates {
        if let Some(len) = len.filter(|len| *len > best_len) {
            best_len = len;
            best = (len, kind);
        }
    }
    best
}

/// A greedy matcher over a category sequence.
struct Matcher<'a> {
    cats: &'a [Category],
    pos: usize,
}

impl<'a> Matcher<'a> {
    fn new(cats: &'a [Category], pos: usize) -> Self {
        Matcher { cats, pos }
    }

    fn peek(&self) -> Option<Category> {
        self.cats.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<Category> {
        self.cats.get(self.pos + ahead).copied()
    }

    fn eat(&mut self, cat: Category) -> bool {
        self.eat_if(|c| c == cat)
    }

    fn eat_if(&mut self, f: impl Fn(Category) -> bool) -> bool {
        match self.peek() {
            Some(c) if f(c) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn eat_all(&mut self, cat: Category) {
        while self.eat(cat) {}
    }

    // (DB As?)?
    fn dot_below(&mut self) {
        if self.eat(Category::DB) {
            self.eat(Category::As);
        }
    }

    // MY? As? MR? ((MW MH? ML? | MH ML? | ML) As?)?
    fn medial_group(&mut self) {
        use Category::*;
        self.eat(MY);
        self.eat(As);
        self.eat(MR);
        let matched = if self.eat(MW) {
            self.eat(MH);
            self.eat(ML);
            true
        } else if self.eat(MH) {
            self.eat(ML);
            true
        } else {
            self.eat(ML)
        };
        if matched {
            self.eat(As);
        }
    }

    // (VPre VS?)* VAbv* VBlw* A* (DB As?)?
    fn main_vowel_group(&mut self) {
        use Category::*;
        while self.eat(VPre) {
            self.eat(VS);
        }
        self.eat_all(VAbv);
        self.eat_all(VBlw);
        self.eat_all(A);
        self.dot_below();
    }

    // VPst MH? ML? As* VAbv* A* (DB As?)?
    fn post_vowel_group(&mut self) -> bool {
        use Category::*;
        if !self.eat(VPst) {
            return false;
        }
        self.eat(MH);
        self.eat(ML);
        self.eat_all(As);
        self.eat_all(VAbv);
        self.eat_all(A);
        self.dot_below();
        true
    }

    // PT A* DB? As?
    fn pwo_tone_group(&mut self) -> bool {
        use Category::*;
        if !self.eat(PT) {
            return false;
        }
        self.eat_all(A);
        self.eat(DB);
        self.eat(As);
        true
    }

    // As* medial_group main_vowel_group post_vowel_group* pwo_tone_group* SM* j?
    fn complex_syllable_tail(&mut self) {
        use Category::*;
        self.eat_all(As);
        self.medial_group();
        self.main_vowel_group();
        while self.post_vowel_group() {}
        while self.pwo_tone_group() {}
        self.eat_all(SM);
        self.eat_if(|c| matches!(c, Zwj | Zwnj));
    }

    // (H (c|IV) VS?)* (H | complex_syllable_tail)
    fn syllable_tail(&mut self) {
        use Category::*;
        while self.peek() == Some(H)
            && matches!(self.peek_at(1), Some(C | Ra | IV))
        {
            self.pos += 2;
            self.eat(VS);
        }
        if !self.eat(H) {
            self.complex_syllable_tail();
        }
    }

    // Ra As H
    fn kinzi(&mut self) -> bool {
        use Category::*;
        if self.peek() == Some(Ra) && self.peek_at(1) == Some(As) && self.peek_at(2) == Some(H) {
            self.pos += 3;
            true
        } else {
            false
        }
    }
}

// (k|CS)? (c|IV|GB|DOTTEDCIRCLE) VS? syllable_tail
fn consonant_syllable(cats: &[Category]) -> Option<usize> {
    let with_prefix = |prefix_len: usize| {
        let mut m = Matcher::new(cats, prefix_len);
        if !m.eat_if(|c| {
            use Category::*;
            matches!(c, C | Ra | IV | GB | DottedCircle)
        }) {
            return None;
        }
        m.eat(Category::VS);
        m.syllable_tail();
        Some(m.pos)
    };
    let mut prefix = Matcher::new(cats, 0);
    let prefixed = if prefix.kinzi() || prefix.eat(Category::CS) {
        with_prefix(prefix.pos)
    } else {
        None
    };
    prefixed.max(with_prefix(0))
}

fn joiner(cats: &[Category]) -> Option<usize> {
    matches!(cats.first(), Some(Category::Zwj | Category::Zwnj)).then_some(1)
}

// P SM
fn punctuation_cluster(cats: &[Category]) -> Option<usize> {
    matches!(cats, [Category::P, Category::SM, ..]).then_some(2)
}

// k? VS? syllable_tail
fn broken_cluster(cats: &[Category]) -> Option<usize> {
    let tail = |start: usize| {
        let mut m = Matcher::new(cats, start);
        m.eat(Category::VS);
        m.syllable_tail();
        m.pos
    };
    let mut prefix = Matcher::new(cats, 0);
    let prefixed = prefix.kinzi().then(|| tail(prefix.pos));
    let len = prefixed.unwrap_or(0).max(tail(0));
    (len > 0).then_some(len)
}

/// Give every broken syllable a dotted circle base.
///
/// Does nothing if the face has no glyph for U+25CC.
pub(crate) fn insert_dotted_circles(face: &Face, buffer: &mut Buffer) {
    if !buffer.has_broken_syllables {
        return;
    }
    let Some(glyph_id) = face.dotted_circle() else {
        trace!("no dotted circle glyph; leaving broken syllables alone");
        return;
    };
    let glyph_props = face.glyph_props(glyph_id, DOTTED_CIRCLE);
    let mut last_syllable = 0;
    let mut i = 0;
    while i < buffer.len() {
        let cur = buffer.info[i];
        if cur.syllable != last_syllable && SyllableType::of(&cur) == SyllableType::Broken {
            last_syllable = cur.syllable;
            let mut dotted_circle = GlyphInfo::new(DOTTED_CIRCLE, cur.cluster);
            dotted_circle.glyph_id = glyph_id;
            dotted_circle.glyph_props = glyph_props;
            dotted_circle.mask = cur.mask;
            dotted_circle.syllable = cur.syllable;
            dotted_circle.myanmar_category = Category::DottedCircle;
            buffer.insert(i, dotted_circle);
            i += 1;
        }
        i += 1;
    }
}

/// Reorder every consonant and broken syllable into visual order.
pub(crate) fn reorder(buffer: &mut Buffer) {
    let mut start = 0;
    while start < buffer.len() {
        let end = buffer.next_syllable(start);
        match SyllableType::of(&buffer.info[start]) {
            // broken clusters have their dotted circle by now
            SyllableType::Consonant | SyllableType::Broken => {
                reorder_consonant_syllable(buffer, start, end)
            }
            SyllableType::Punctuation | SyllableType::NonMyanmar => (),
        }
        start = end;
    }
}

fn reorder_consonant_syllable(buffer: &mut Buffer, start: usize, end: usize) {
    assign_positions(&mut buffer.info[start..end]);
    buffer.sort(start, end, |info| info.myanmar_position);

    // The sort puts left matras in logical order, but they are drawn
    // right to left. Reverse the run, then restore each matra's trailing
    // variation selectors.
    let info = &buffer.info;
    let first_left_matra = (start..end).find(|&i| info[i].myanmar_position == Position::PreM);
    let last_left_matra = (start..end).rfind(|&i| info[i].myanmar_position == Position::PreM);
    let (Some(first), Some(last)) = (first_left_matra, last_left_matra) else {
        return;
    };
    if first < last {
        buffer.reverse_range(first, last + 1);
        let mut i = first;
        for j in first..=last {
            if buffer.info[j].myanmar_category == Category::VPre {
                buffer.reverse_range(i, j + 1);
                i = j + 1;
            }
        }
    }
}

/// Tag every glyph of a consonant syllable with its [`Position`].
fn assign_positions(syllable: &mut [GlyphInfo]) {
    let end = syllable.len();
    let has_reph = matches!(
        syllable,
        [a, b, c, ..] if a.myanmar_category == Category::Ra
            && b.myanmar_category == Category::As
            && c.myanmar_category == Category::H
    );
    let limit = if has_reph { 3 } else { 0 };
    let base = (limit..end)
        .find(|&i| syllable[i].myanmar_category.is_consonant())
        .unwrap_or(if has_reph { 0 } else { limit });

    let mut i = 0;
    while i < limit {
        syllable[i].myanmar_position = Position::AfterMain;
        i += 1;
    }
    while i < base {
        syllable[i].myanmar_position = Position::PreC;
        i += 1;
    }
    if i < end {
        syllable[i].myanmar_position = Position::BaseC;
        i += 1;
    }

    let mut pos = Position::AfterMain;
    for i in i..end {
        let category = syllable[i].myanmar_category;
        let assigned = match category {
            Category::MR => Position::PreC,
            Category::VPre => Position::PreM,
            Category::VS => syllable[i - 1].myanmar_position,
            Category::VBlw if pos == Position::AfterMain => {
                pos = Position::BelowC;
                pos
            }
            Category::A if pos == Position::BelowC => Position::BeforeSub,
            Category::VBlw if pos == Position::BelowC => pos,
            _ if pos == Position::BelowC => {
                pos = Position::AfterSub;
                pos
            }
            _ => pos,
        };
        syllable[i].myanmar_position = assigned;
    }
}
