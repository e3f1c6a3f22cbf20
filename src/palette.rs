//! Fixed colour/finish tables per part category.
//!
//! The same tables back both [`crate::color_applier::ColorApplier`] and the palette handed to
//! the surrounding UI, so a swatch the user can pick always resolves to the colour it shows.

use crate::part::PartCategory;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorEntry {
    pub name: &'static str,
    /// sRGB `0xRRGGBB`.
    pub hex: u32,
}

impl ColorEntry {
    const fn new(name: &'static str, hex: u32) -> Self {
        Self { name, hex }
    }

    pub fn linear(&self) -> Vec3 {
        hex_to_linear(self.hex)
    }

    pub fn srgb(&self) -> [u8; 3] {
        [((self.hex >> 16) & 0xff) as u8, ((self.hex >> 8) & 0xff) as u8, (self.hex & 0xff) as u8]
    }
}

const BODY_COLORS: [ColorEntry; 5] = [
    ColorEntry::new("gray", 0x808080),
    ColorEntry::new("white", 0xffffff),
    ColorEntry::new("red", 0xff0000),
    ColorEntry::new("blue", 0x0000ff),
    ColorEntry::new("green", 0x00ff00),
];

const BRAKE_DISC_COLORS: [ColorEntry; 3] = [
    ColorEntry::new("gray", 0x808080),
    ColorEntry::new("black", 0x000000),
    ColorEntry::new("silver", 0xc0c0c0),
];

const SEAT_COLORS: [ColorEntry; 4] = [
    ColorEntry::new("brown", 0x835440),
    ColorEntry::new("white", 0xffffff),
    ColorEntry::new("beige", 0xd5ba98),
    ColorEntry::new("red", 0xff6347),
];

const RIM_COLORS: [ColorEntry; 4] = [
    ColorEntry::new("gray", 0x808080),
    ColorEntry::new("black", 0x000000),
    ColorEntry::new("silver", 0xc0c0c0),
    ColorEntry::new("gold", 0xffd700),
];

/// Finish forced onto every Body material when it is first classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDefaults {
    pub color: ColorEntry,
    pub metalness: f32,
    pub roughness: f32,
}

pub const BODY_DEFAULTS: BodyDefaults =
    BodyDefaults { color: ColorEntry::new("white", 0xffffff), metalness: 0.8, roughness: 0.3 };

/// Finish applied to rim materials on every recolour, whatever the colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RimFinish {
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    pub clearcoat: f32,
}

pub const RIM_FINISH: RimFinish =
    RimFinish { metalness: 0.9, roughness: 0.2, emissive: Vec3::ZERO, clearcoat: 1.0 };

/// Result of looking a colour name up in a category's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColor {
    pub entry: ColorEntry,
    pub fallback: bool,
}

pub struct ColorTable;

impl ColorTable {
    /// Ordered colour choices for a category, as presented to the user.
    pub fn entries(category: PartCategory) -> &'static [ColorEntry] {
        match category {
            PartCategory::Body => &BODY_COLORS,
            PartCategory::BrakeDisc => &BRAKE_DISC_COLORS,
            PartCategory::Seat => &SEAT_COLORS,
            PartCategory::Rim => &RIM_COLORS,
        }
    }

    /// Colour used when a name is not in the category's table.
    pub fn fallback(category: PartCategory) -> ColorEntry {
        match category {
            PartCategory::Body => BODY_COLORS[1],
            PartCategory::BrakeDisc => BRAKE_DISC_COLORS[0],
            PartCategory::Seat => SEAT_COLORS[0],
            PartCategory::Rim => RIM_COLORS[0],
        }
    }

    /// Exact, case-sensitive lookup with the documented per-category fallback.
    pub fn resolve(category: PartCategory, name: &str) -> ResolvedColor {
        match Self::entries(category).iter().find(|entry| entry.name == name) {
            Some(entry) => ResolvedColor { entry: *entry, fallback: false },
            None => ResolvedColor { entry: Self::fallback(category), fallback: true },
        }
    }
}

/// Palette for a consumer-facing part name ("car", "brake", "seats", "rim").
pub fn palette(part_name: &str) -> Option<&'static [ColorEntry]> {
    PartCategory::from_part_name(part_name).map(ColorTable::entries)
}

pub fn hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve_exactly() {
        let red = ColorTable::resolve(PartCategory::Body, "red");
        assert!(!red.fallback);
        assert_eq!(red.entry.hex, 0xff0000);
        let seat_red = ColorTable::resolve(PartCategory::Seat, "red");
        assert_eq!(seat_red.entry.hex, 0xff6347, "seat red is tomato, not pure red");
    }

    #[test]
    fn unknown_names_use_category_fallback() {
        assert_eq!(ColorTable::resolve(PartCategory::Body, "black").entry.name, "white");
        assert_eq!(ColorTable::resolve(PartCategory::BrakeDisc, "gold").entry.name, "gray");
        assert_eq!(ColorTable::resolve(PartCategory::Seat, "green").entry.name, "brown");
        let rim = ColorTable::resolve(PartCategory::Rim, "unknown-color");
        assert!(rim.fallback);
        assert_eq!(rim.entry.hex, 0x808080);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(ColorTable::resolve(PartCategory::Rim, "Gold").fallback);
    }

    #[test]
    fn palette_follows_color_table() {
        for category in PartCategory::ALL {
            let swatches = palette(category.part_name()).expect("palette for known part");
            assert_eq!(swatches, ColorTable::entries(category));
            for swatch in swatches {
                assert!(!ColorTable::resolve(category, swatch.name).fallback);
            }
        }
        assert!(palette("wheels").is_none());
    }

    #[test]
    fn hex_conversion_keeps_primaries() {
        assert_eq!(hex_to_linear(0xff0000), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(hex_to_linear(0x000000), Vec3::ZERO);
        let gray = hex_to_linear(0x808080);
        assert!((gray.x - 0.2158).abs() < 1e-3);
        assert_eq!(ColorEntry::new("gold", 0xffd700).srgb(), [255, 215, 0]);
    }
}
