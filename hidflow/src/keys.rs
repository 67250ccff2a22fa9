//! HID boot-keyboard usage ids, modifier bits, and the US-layout
//! character mapping used when typing text through the gadget.

use serde::{Deserialize, Serialize};

/// Usage ids from the HID keyboard/keypad usage page that the engine
/// injects directly (everything else goes through [`char_to_usage`]).
pub mod usage {
    pub const A: u8 = 0x04;
    pub const B: u8 = 0x05;
    pub const R: u8 = 0x15;
    pub const T: u8 = 0x17;
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const TAB: u8 = 0x2b;
    pub const SPACE: u8 = 0x2c;
    pub const ARROW_DOWN: u8 = 0x51;
}

/// Modifier byte of an 8-byte boot keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(1 << 0);
    pub const SHIFT: Modifiers = Modifiers(1 << 1);
    pub const ALT: Modifiers = Modifiers(1 << 2);
    pub const GUI: Modifiers = Modifiers(1 << 3);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// One press-and-release of a usage id under a modifier mask.
///
/// A chord with `usage == 0` taps the modifiers alone (the original
/// device opens the application menu this way, with a bare GUI tap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chord {
    pub modifiers: Modifiers,
    pub usage: u8,
}

impl Chord {
    pub fn new(modifiers: Modifiers, usage: u8) -> Self {
        Self { modifiers, usage }
    }

    /// A chord with no modifiers.
    pub fn bare(usage: u8) -> Self {
        Self::new(Modifiers::NONE, usage)
    }

    /// A tap of the modifiers alone, no key.
    pub fn modifier_tap(modifiers: Modifiers) -> Self {
        Self::new(modifiers, 0)
    }
}

/// Maps an ASCII character onto a `(usage, needs_shift)` pair for the US
/// layout. Returns `None` for characters a boot keyboard cannot type.
pub fn char_to_usage(ch: char) -> Option<(u8, bool)> {
    let mapped = match ch {
        'a'..='z' => (0x04 + (ch as u8 - b'a'), false),
        'A'..='Z' => (0x04 + (ch.to_ascii_lowercase() as u8 - b'a'), true),
        '1'..='9' => (0x1e + (ch as u8 - b'1'), false),
        '0' => (0x27, false),
        '!' => (0x1e, true),
        '@' => (0x1f, true),
        '#' => (0x20, true),
        '$' => (0x21, true),
        '%' => (0x22, true),
        '^' => (0x23, true),
        '&' => (0x24, true),
        '*' => (0x25, true),
        '(' => (0x26, true),
        ')' => (0x27, true),
        '\n' => (usage::ENTER, false),
        '\t' => (usage::TAB, false),
        ' ' => (usage::SPACE, false),
        '-' => (0x2d, false),
        '_' => (0x2d, true),
        '=' => (0x2e, false),
        '+' => (0x2e, true),
        '[' => (0x2f, false),
        '{' => (0x2f, true),
        ']' => (0x30, false),
        '}' => (0x30, true),
        '\\' => (0x31, false),
        '|' => (0x31, true),
        ';' => (0x33, false),
        ':' => (0x33, true),
        '\'' => (0x34, false),
        '"' => (0x34, true),
        '`' => (0x35, false),
        '~' => (0x35, true),
        ',' => (0x36, false),
        '<' => (0x36, true),
        '.' => (0x37, false),
        '>' => (0x37, true),
        '/' => (0x38, false),
        '?' => (0x38, true),
        _ => return None,
    };
    Some(mapped)
}
