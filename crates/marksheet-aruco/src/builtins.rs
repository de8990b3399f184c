//! Embedded built-in dictionaries.

#![allow(clippy::unreadable_literal)]

use crate::Dictionary;

/// OpenCV `DICT_4X4_50`: 50 markers, 4×4 inner bits, min distance 4.
pub const DICT_4X4_50: Dictionary = Dictionary {
    name: "DICT_4X4_50",
    marker_size: 4,
    max_correction_bits: 1,
    codes: &[
        0xb352, 0xa60f, 0x4b33, 0x9d66, 0x86d5, 0x4c61, 0x8b86, 0xb0dc, 0xa480, 0x950c, //
        0x7660, 0x1a77, 0x128f, 0x0fab, 0x72db, 0x839b, 0x599d, 0xff99, 0x85c9, 0x0a91, //
        0x2e9e, 0x2bf2, 0x54cc, 0xbe44, 0x1d80, 0x71d6, 0xd8ca, 0xd55a, 0x3b7b, 0x09d3, //
        0x57dd, 0xb215, 0x0c86, 0x2cf0, 0x8aef, 0x6b6f, 0x51e7, 0x00df, 0x904f, 0xa5c7, //
        0xe717, 0xebab, 0xceb3, 0xb2e3, 0xe8db, 0x288b, 0x034b, 0xd92d, 0x8bf5, 0x37f5,
    ],
};

/// Names accepted by [`builtin_dictionary`].
pub const BUILTIN_DICTIONARY_NAMES: &[&str] = &["DICT_4X4_50"];

/// Look up an embedded dictionary by its OpenCV name.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    match name {
        "DICT_4X4_50" => Some(DICT_4X4_50),
        _ => None,
    }
}
