//! # Controller Family Mapping Tables
//!
//! Per controller family, an immutable association from control name to a
//! bit offset within the wire frame, plus the frame's total byte length.
//!
//! Two families ship with padview:
//! - N64-style pads (33-byte frames)
//! - GameCube-style pads (65-byte frames)
//!
//! Adding a family means adding one enum variant, one table and one frame
//! length constant; no other component changes.

/// Frame length in bytes for N64-style pads
pub const N64_FRAME_LENGTH: usize = 33;

/// Frame length in bytes for GameCube-style pads
pub const GAMECUBE_FRAME_LENGTH: usize = 65;

/// Every frame ends with this terminator byte
pub const FRAME_TERMINATOR: u8 = 0x0A;

/// Number of consecutive bytes occupied by one bit-per-byte field
pub const FIELD_BYTES: usize = 8;

/// Control name to bit offset, N64 layout.
///
/// `stick_x`/`stick_y` are 8-byte bit-per-byte fields; everything else is a
/// single boolean byte.
const N64_MAPPING: &[(&str, usize)] = &[
    ("a", 0),
    ("b", 1),
    ("z", 2),
    ("start", 3),
    ("up", 4),
    ("down", 5),
    ("left", 6),
    ("right", 7),
    ("l", 10),
    ("r", 11),
    ("cup", 12),
    ("cdown", 13),
    ("cleft", 14),
    ("cright", 15),
    ("stick_x", 16),
    ("stick_y", 24),
];

/// Control name to bit offset, GameCube layout.
const GAMECUBE_MAPPING: &[(&str, usize)] = &[
    ("start", 3),
    ("y", 4),
    ("x", 5),
    ("b", 6),
    ("a", 7),
    ("l", 9),
    ("r", 10),
    ("z", 11),
    ("up", 12),
    ("down", 13),
    ("right", 14),
    ("left", 15),
    ("lstick_x", 16),
    ("lstick_y", 24),
    ("cstick_x", 32),
    ("cstick_y", 40),
    ("trig_l", 48),
    ("trig_r", 56),
];

/// Supported controller protocol families.
///
/// A closed set: each variant carries its own mapping table and frame
/// length, and the frame decoder applies the same bit-unpacking rule to
/// every family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControllerFamily {
    N64,
    GameCube,
}

impl ControllerFamily {
    /// All supported families, in display order
    pub const ALL: &'static [ControllerFamily] =
        &[ControllerFamily::N64, ControllerFamily::GameCube];

    /// Parse a family from its descriptor attribute name
    /// (`"n64"` / `"gamecube"`).
    ///
    /// # Returns
    ///
    /// * `Option<ControllerFamily>` - `None` for unknown names
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "n64" => Some(ControllerFamily::N64),
            "gamecube" => Some(ControllerFamily::GameCube),
            _ => None,
        }
    }

    /// Parse a semicolon-separated family list as found in the descriptor's
    /// declaration element, e.g. `"n64;gamecube"`.
    ///
    /// Unknown names are dropped; an empty result means the declaration did
    /// not name any supported family.
    pub fn parse_list(list: &str) -> Vec<Self> {
        let mut families = Vec::new();
        for part in list.split(';') {
            if let Some(family) = Self::from_name(part) {
                if !families.contains(&family) {
                    families.push(family);
                }
            }
        }
        families
    }

    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ControllerFamily::N64 => "N64",
            ControllerFamily::GameCube => "GameCube",
        }
    }

    /// Total byte length of one wire frame for this family,
    /// terminator included
    pub fn frame_length(&self) -> usize {
        match self {
            ControllerFamily::N64 => N64_FRAME_LENGTH,
            ControllerFamily::GameCube => GAMECUBE_FRAME_LENGTH,
        }
    }

    /// The family's name-to-offset table
    fn mapping(&self) -> &'static [(&'static str, usize)] {
        match self {
            ControllerFamily::N64 => N64_MAPPING,
            ControllerFamily::GameCube => GAMECUBE_MAPPING,
        }
    }

    /// Resolve a control name to its bit offset within the frame.
    ///
    /// # Arguments
    ///
    /// * `name` - Control name as declared in a skin descriptor
    ///
    /// # Returns
    ///
    /// * `Option<usize>` - Bit offset, or `None` for unmapped names
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.mapping()
            .iter()
            .find(|(control, _)| *control == name)
            .map(|&(_, offset)| offset)
    }
}

impl std::fmt::Display for ControllerFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_names() {
        assert_eq!(ControllerFamily::N64.lookup("a"), Some(0));
        assert_eq!(ControllerFamily::N64.lookup("start"), Some(3));
        assert_eq!(ControllerFamily::N64.lookup("stick_y"), Some(24));
        assert_eq!(ControllerFamily::GameCube.lookup("a"), Some(7));
        assert_eq!(ControllerFamily::GameCube.lookup("trig_r"), Some(56));
    }

    #[test]
    fn test_lookup_unknown_name() {
        assert_eq!(ControllerFamily::N64.lookup("cstick_x"), None);
        assert_eq!(ControllerFamily::GameCube.lookup("cup"), None);
        assert_eq!(ControllerFamily::N64.lookup(""), None);
    }

    #[test]
    fn test_offsets_unique_and_in_range() {
        for family in ControllerFamily::ALL {
            let mapping = family.mapping();
            for (i, &(name, offset)) in mapping.iter().enumerate() {
                assert!(
                    offset < family.frame_length(),
                    "{name} offset {offset} outside {family} frame"
                );
                for &(other, other_offset) in &mapping[i + 1..] {
                    assert_ne!(
                        offset, other_offset,
                        "{name} and {other} share offset {offset}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_frame_lengths() {
        assert_eq!(ControllerFamily::N64.frame_length(), 33);
        assert_eq!(ControllerFamily::GameCube.frame_length(), 65);
    }

    #[test]
    fn test_axis_fields_leave_room_for_eight_bytes() {
        // Stick and trigger fields occupy 8 consecutive bytes; the frame
        // must have room for all of them before the terminator.
        for (family, fields) in [
            (ControllerFamily::N64, vec!["stick_x", "stick_y"]),
            (
                ControllerFamily::GameCube,
                vec![
                    "lstick_x", "lstick_y", "cstick_x", "cstick_y", "trig_l", "trig_r",
                ],
            ),
        ] {
            for name in fields {
                let offset = family.lookup(name).unwrap();
                assert!(offset + FIELD_BYTES <= family.frame_length());
            }
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ControllerFamily::from_name("n64"), Some(ControllerFamily::N64));
        assert_eq!(
            ControllerFamily::from_name("gamecube"),
            Some(ControllerFamily::GameCube)
        );
        assert_eq!(ControllerFamily::from_name(" n64 "), Some(ControllerFamily::N64));
        assert_eq!(ControllerFamily::from_name("N64"), None);
        assert_eq!(ControllerFamily::from_name("snes"), None);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ControllerFamily::parse_list("n64;gamecube"),
            vec![ControllerFamily::N64, ControllerFamily::GameCube]
        );
        assert_eq!(
            ControllerFamily::parse_list("gamecube"),
            vec![ControllerFamily::GameCube]
        );
        // Unknown entries are dropped, duplicates collapse
        assert_eq!(
            ControllerFamily::parse_list("snes;n64;n64"),
            vec![ControllerFamily::N64]
        );
        assert!(ControllerFamily::parse_list("").is_empty());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ControllerFamily::N64.to_string(), "N64");
        assert_eq!(ControllerFamily::GameCube.to_string(), "GameCube");
    }
}
