//! Deciding how a run of text is shaped.

use crate::buffer::{Buffer, Direction};
use crate::myanmar;

/// The writing systems the shaper tells apart.
///
/// Only Myanmar has script specific processing; the others choose a default
/// direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Script {
    /// Characters shared between scripts, such as digits and punctuation.
    #[default]
    Common,
    Latin,
    Greek,
    Cyrillic,
    Hebrew,
    Arabic,
    Myanmar,
}

impl Script {
    /// The script of a character, or `None` if it belongs to no particular
    /// script.
    pub fn of(c: char) -> Option<Script> {
        let c = c as u32;
        let script = match c {
            0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F | 0x1E00..=0x1EFF => Script::Latin,
            0x0370..=0x03FF | 0x1F00..=0x1FFF => Script::Greek,
            0x0400..=0x052F => Script::Cyrillic,
            0x0590..=0x05FF | 0xFB1D..=0xFB4F => Script::Hebrew,
            0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => {
                Script::Arabic
            }
            _ if myanmar::is_myanmar(c) => Script::Myanmar,
            _ => return None,
        };
        Some(script)
    }

    /// The script of the first character that has one.
    pub fn guess(text: &str) -> Script {
        text.chars().find_map(Script::of).unwrap_or_default()
    }

    /// The direction text of this script runs in when set horizontally.
    pub fn horizontal_direction(self) -> Direction {
        match self {
            Script::Hebrew | Script::Arabic => Direction::RightToLeft,
            _ => Direction::LeftToRight,
        }
    }
}

/// Options for one call to [`shape`](crate::shape).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapingOptions {
    /// Overrides the direction implied by the script.
    pub direction: Option<Direction>,
    /// Overrides the script guessed from the text.
    pub script: Option<Script>,
    /// Split a kerning adjustment evenly between the two glyphs of a pair
    /// instead of applying it all to the first.
    pub split_kerning: bool,
    /// Always match ligatures exhaustively; slower on large ligature sets.
    pub optimize_size: bool,
    /// Repair broken Myanmar syllables with a dotted circle base.
    pub insert_dotted_circle: bool,
}

impl Default for ShapingOptions {
    fn default() -> Self {
        ShapingOptions {
            direction: None,
            script: None,
            split_kerning: false,
            optimize_size: false,
            insert_dotted_circle: true,
        }
    }
}

impl ShapingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_split_kerning(mut self, split_kerning: bool) -> Self {
        self.split_kerning = split_kerning;
        self
    }

    pub fn with_optimize_size(mut self, optimize_size: bool) -> Self {
        self.optimize_size = optimize_size;
        self
    }

    pub fn with_dotted_circle(mut self, insert_dotted_circle: bool) -> Self {
        self.insert_dotted_circle = insert_dotted_circle;
        self
    }
}

/// Which script specific processing runs before the lookups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComplexShaper {
    #[default]
    Default,
    Myanmar,
}

/// The resolved settings for shaping one buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapePlan {
    pub direction: Direction,
    pub script: Script,
    pub shaper: ComplexShaper,
    /// Substitutions may not match across syllables.
    pub per_syllable: bool,
    pub split_kerning: bool,
    pub optimize_size: bool,
    pub insert_dotted_circle: bool,
}

impl ShapePlan {
    pub fn new(options: &ShapingOptions, buffer: &Buffer) -> Self {
        let script = options.script.unwrap_or_else(|| {
            buffer
                .info
                .iter()
                .filter_map(|info| char::from_u32(info.codepoint))
                .find_map(Script::of)
                .unwrap_or_default()
        });
        let direction = options
            .direction
            .unwrap_or_else(|| script.horizontal_direction());
        let shaper = match script {
            Script::Myanmar => ComplexShaper::Myanmar,
            _ => ComplexShaper::Default,
        };
        ShapePlan {
            direction,
            script,
            shaper,
            per_syllable: shaper == ComplexShaper::Myanmar,
            split_kerning: options.split_kerning,
            optimize_size: options.optimize_size,
            insert_dotted_circle: options.insert_dotted_circle,
        }
    }
}
