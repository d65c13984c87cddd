//! Legacy color indices.
//!
//! Binary documents before piece record version 4 store colors as an index
//! into a fixed palette. Each index maps to an LDraw color code.

const LEGACY_COLORS: [u32; 28] = [
    4, 12, 2, 10, 1, 9, 14, 15, 8, 0, 6, 13, 13, 334, 36, 44, 34, 42, 33, 41, 46, 47, 7, 382, 6,
    13, 11, 383,
];

/// LDraw color code for a legacy palette index, or `fallback` when the
/// index is outside the palette.
pub fn legacy_color(index: u8, fallback: u32) -> u32 {
    match LEGACY_COLORS.get(index as usize) {
        Some(&code) => code,
        None => {
            log::warn!("Unknown legacy color index {}, using {}", index, fallback);
            fallback
        }
    }
}
