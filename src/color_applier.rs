use crate::material::Material;
use crate::material_registry::MaterialRegistry;
use crate::palette::{ColorTable, ResolvedColor, RIM_FINISH};
use crate::part::PartCategory;

/// Recolours classified materials in place from the fixed colour tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorApplier;

impl ColorApplier {
    /// Applies `color_name` to every material registered for `category` and returns how many
    /// materials were touched. An empty entry is a no-op; unknown names use the category
    /// fallback colour.
    pub fn apply(&self, registry: &MaterialRegistry, category: PartCategory, color_name: &str) -> usize {
        let materials = registry.materials(category);
        if materials.is_empty() {
            log::debug!("no {category} materials classified yet, ignoring '{color_name}'");
            return 0;
        }
        let resolved = ColorTable::resolve(category, color_name);
        if resolved.fallback {
            log::debug!(
                "unknown {category} colour '{color_name}', using fallback '{}'",
                resolved.entry.name
            );
        }
        for handle in materials {
            let mut material = handle.borrow_mut();
            Self::apply_to_material(&mut material, category, resolved);
        }
        materials.len()
    }

    fn apply_to_material(material: &mut Material, category: PartCategory, resolved: ResolvedColor) {
        material.base_color = resolved.entry.linear();
        if category != PartCategory::Rim {
            return;
        }
        material.metalness = RIM_FINISH.metalness;
        material.roughness = RIM_FINISH.roughness;
        if let Some(emissive) = material.emissive.as_mut() {
            *emissive = RIM_FINISH.emissive;
        }
        if let Some(clearcoat) = material.clearcoat.as_mut() {
            *clearcoat = RIM_FINISH.clearcoat;
        }
        material.mark_needs_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialHandle;
    use crate::palette::hex_to_linear;
    use glam::Vec3;

    fn registry_with(category: PartCategory, materials: &[MaterialHandle]) -> MaterialRegistry {
        let mut registry = MaterialRegistry::new();
        for material in materials {
            registry.record(category, material.clone());
        }
        registry
    }

    #[test]
    fn empty_entry_is_a_no_op() {
        let registry = MaterialRegistry::new();
        for category in PartCategory::ALL {
            assert_eq!(ColorApplier.apply(&registry, category, "red"), 0);
        }
    }

    #[test]
    fn body_color_changes_only_color() {
        let body = MaterialHandle::new(Material::standard("paint", Vec3::ONE, 0.8, 0.3));
        let registry = registry_with(PartCategory::Body, &[body.clone()]);
        assert_eq!(ColorApplier.apply(&registry, PartCategory::Body, "blue"), 1);
        let material = body.borrow();
        assert_eq!(material.base_color, hex_to_linear(0x0000ff));
        assert_eq!(material.metalness, 0.8);
        assert!(!material.needs_update());
    }

    #[test]
    fn unknown_rim_color_falls_back_to_gray_and_still_finishes() {
        let rim = MaterialHandle::new(
            Material::standard("rims", Vec3::ONE, 0.1, 0.9).with_emissive(Vec3::X).with_clearcoat(0.0),
        );
        let registry = registry_with(PartCategory::Rim, &[rim.clone()]);
        ColorApplier.apply(&registry, PartCategory::Rim, "unknown-color");
        let material = rim.borrow();
        assert_eq!(material.base_color, hex_to_linear(0x808080));
        assert_eq!(material.metalness, 0.9);
        assert_eq!(material.roughness, 0.2);
        assert_eq!(material.emissive, Some(Vec3::ZERO));
        assert_eq!(material.clearcoat, Some(1.0));
        assert!(material.needs_update());
    }

    #[test]
    fn rim_finish_respects_missing_capabilities() {
        let basic = MaterialHandle::new(Material::basic("rims_basic", Vec3::ONE));
        let registry = registry_with(PartCategory::Rim, &[basic.clone()]);
        ColorApplier.apply(&registry, PartCategory::Rim, "gold");
        let material = basic.borrow();
        assert_eq!(material.emissive, None);
        assert_eq!(material.clearcoat, None);
        assert_eq!(material.base_color, hex_to_linear(0xffd700));
        assert_eq!(material.metalness, 0.9);
    }

    #[test]
    fn collection_recolors_every_material() {
        let discs: Vec<_> = (0..3)
            .map(|i| MaterialHandle::new(Material::standard(format!("disc_{i}"), Vec3::ONE, 1.0, 0.5)))
            .collect();
        let registry = registry_with(PartCategory::BrakeDisc, &discs);
        assert_eq!(ColorApplier.apply(&registry, PartCategory::BrakeDisc, "black"), 3);
        assert!(discs.iter().all(|disc| disc.borrow().base_color == Vec3::ZERO));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let rim = MaterialHandle::new(Material::standard("rims", Vec3::ONE, 0.1, 0.9).with_clearcoat(0.3));
        let registry = registry_with(PartCategory::Rim, &[rim.clone()]);
        ColorApplier.apply(&registry, PartCategory::Rim, "silver");
        let first = rim.snapshot();
        ColorApplier.apply(&registry, PartCategory::Rim, "silver");
        assert_eq!(rim.snapshot(), first);
    }
}
