//! Name-based classification of mesh materials into part categories.
//!
//! Every rule is evaluated independently against every mesh node: a mesh may land in several
//! categories or in none. Case handling is per rule and intentionally not uniform.

use crate::material::Material;
use crate::material_registry::MaterialRegistry;
use crate::model::ModelRoot;
use crate::palette::BODY_DEFAULTS;
use crate::part::PartCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Sensitive,
    Insensitive,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifierRule {
    pub id: &'static str,
    /// Substrings; any one of them matching is enough.
    pub patterns: &'static [&'static str],
    pub case: CaseMode,
    pub category: PartCategory,
}

impl ClassifierRule {
    pub fn matches(&self, name: &str) -> bool {
        match self.case {
            CaseMode::Sensitive => self.patterns.iter().any(|pattern| name.contains(pattern)),
            CaseMode::Insensitive => {
                let lowered = name.to_lowercase();
                self.patterns.iter().any(|pattern| lowered.contains(&pattern.to_lowercase()))
            }
        }
    }
}

pub const RULES: [ClassifierRule; 4] = [
    ClassifierRule {
        id: "R1",
        patterns: &["car_main_paint", "TRDEF-Body"],
        case: CaseMode::Sensitive,
        category: PartCategory::Body,
    },
    ClassifierRule {
        id: "R2",
        patterns: &["brake_disc"],
        case: CaseMode::Insensitive,
        category: PartCategory::BrakeDisc,
    },
    ClassifierRule { id: "R3", patterns: &["seats"], case: CaseMode::Sensitive, category: PartCategory::Seat },
    ClassifierRule { id: "R4", patterns: &["rims"], case: CaseMode::Insensitive, category: PartCategory::Rim },
];

/// Categories matched by a mesh name, in rule order.
pub fn categories_for(name: &str) -> impl Iterator<Item = PartCategory> + '_ {
    RULES.iter().filter(move |rule| rule.matches(name)).map(|rule| rule.category)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    pub meshes_visited: usize,
    pub matches: [usize; PartCategory::COUNT],
    pub unclassified: Vec<String>,
}

impl ClassificationReport {
    pub fn matches_for(&self, category: PartCategory) -> usize {
        self.matches[category.index()]
    }
}

/// Walks `root` once and records every matching mesh material in `registry`.
///
/// Body materials get the default paint finish as they are recorded.
pub fn classify(root: &ModelRoot, registry: &mut MaterialRegistry) -> ClassificationReport {
    let mut report = ClassificationReport::default();
    root.traverse(|node, _| {
        let Some(mesh) = node.mesh.as_ref() else {
            return;
        };
        report.meshes_visited += 1;
        log::debug!("mesh '{}' material '{}'", node.name, mesh.material.borrow().label);

        let mut matched = false;
        for rule in RULES.iter().filter(|rule| rule.matches(&node.name)) {
            matched = true;
            log::debug!("mesh '{}' matched {} -> {}", node.name, rule.id, rule.category);
            if rule.category == PartCategory::Body {
                apply_body_defaults(&mut mesh.material.borrow_mut());
            }
            registry.record(rule.category, mesh.material.clone());
            report.matches[rule.category.index()] += 1;
        }
        if !matched {
            report.unclassified.push(node.name.clone());
        }
    });
    report
}

fn apply_body_defaults(material: &mut Material) {
    material.base_color = BODY_DEFAULTS.color.linear();
    material.metalness = BODY_DEFAULTS.metalness;
    material.roughness = BODY_DEFAULTS.roughness;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialHandle;
    use crate::mesh::MeshGeometry;
    use crate::model::SceneNode;
    use glam::Vec3;
    use std::sync::Arc;

    fn mesh(name: &str) -> (SceneNode, MaterialHandle) {
        let material = MaterialHandle::new(Material::standard(name, Vec3::splat(0.1), 0.0, 1.0));
        (SceneNode::mesh(name, Arc::new(MeshGeometry::triangle()), material.clone()), material)
    }

    #[test]
    fn rule_case_modes_differ() {
        assert_eq!(categories_for("TRDEF-Body_01").collect::<Vec<_>>(), [PartCategory::Body]);
        assert_eq!(categories_for("trdef-body_01").count(), 0);
        assert_eq!(categories_for("Front_BRAKE_DISC").collect::<Vec<_>>(), [PartCategory::BrakeDisc]);
        assert_eq!(categories_for("Seats_front").count(), 0);
        assert_eq!(categories_for("front_seats").collect::<Vec<_>>(), [PartCategory::Seat]);
        assert_eq!(categories_for("RIMS_rear").collect::<Vec<_>>(), [PartCategory::Rim]);
    }

    #[test]
    fn singular_rim_does_not_match_rims_rule() {
        assert_eq!(categories_for("Rim_FL").count(), 0);
        assert_eq!(categories_for("Rim_FR").count(), 0);
    }

    #[test]
    fn rules_are_not_mutually_exclusive() {
        let categories: Vec<_> = categories_for("car_main_paint_rims_brake_disc").collect();
        assert_eq!(categories, [PartCategory::Body, PartCategory::BrakeDisc, PartCategory::Rim]);
    }

    #[test]
    fn classify_records_by_arity_and_paints_body() {
        let (body, body_material) = mesh("car_main_paint");
        let (seat_a, _) = mesh("front_seats");
        let (seat_b, seat_b_material) = mesh("rear_seats");
        let (disc_a, _) = mesh("brake_disc_fl");
        let (disc_b, _) = mesh("Brake_Disc_FR");
        let (glass, _) = mesh("windshield");
        let root = ModelRoot::new(vec![SceneNode::group(
            "car",
            vec![body, seat_a, seat_b, disc_a, disc_b, glass],
        )]);

        let mut registry = MaterialRegistry::new();
        let report = classify(&root, &mut registry);

        assert_eq!(report.meshes_visited, 6);
        assert_eq!(report.unclassified, ["windshield"]);
        assert_eq!(report.matches_for(PartCategory::Seat), 2);
        assert_eq!(registry.len(PartCategory::Seat), 1);
        assert!(registry.materials(PartCategory::Seat)[0].same_material(&seat_b_material));
        assert_eq!(registry.len(PartCategory::BrakeDisc), 2);

        let body = body_material.borrow();
        assert_eq!(body.base_color, BODY_DEFAULTS.color.linear());
        assert_eq!(body.metalness, 0.8);
        assert_eq!(body.roughness, 0.3);
    }

    #[test]
    fn second_body_mesh_replaces_first_but_both_get_defaults() {
        let (first, first_material) = mesh("car_main_paint");
        let (second, second_material) = mesh("TRDEF-Body_02");
        let root = ModelRoot::new(vec![first, second]);

        let mut registry = MaterialRegistry::new();
        let report = classify(&root, &mut registry);

        assert_eq!(report.matches_for(PartCategory::Body), 2);
        assert_eq!(registry.len(PartCategory::Body), 1);
        let slot = &registry.materials(PartCategory::Body)[0];
        assert!(slot.same_material(&second_material));
        assert!(!slot.same_material(&first_material));
        for handle in [&first_material, &second_material] {
            let material = handle.borrow();
            assert_eq!(material.base_color, BODY_DEFAULTS.color.linear());
            assert_eq!(material.metalness, BODY_DEFAULTS.metalness);
            assert_eq!(material.roughness, BODY_DEFAULTS.roughness);
        }
    }

    #[test]
    fn shared_material_is_appended_once_per_mesh() {
        let material = MaterialHandle::new(Material::standard("rims", Vec3::ONE, 0.0, 1.0));
        let geometry = Arc::new(MeshGeometry::triangle());
        let root = ModelRoot::new(vec![
            SceneNode::mesh("rims_left", geometry.clone(), material.clone()),
            SceneNode::mesh("rims_right", geometry, material.clone()),
        ]);
        let mut registry = MaterialRegistry::new();
        classify(&root, &mut registry);
        let rims = registry.materials(PartCategory::Rim);
        assert_eq!(rims.len(), 2);
        assert!(rims.iter().all(|handle| handle.same_material(&material)));
    }

    #[test]
    fn group_nodes_are_not_classified() {
        let (wheel, _) = mesh("wheel");
        let root = ModelRoot::new(vec![SceneNode::group("rims_group", vec![wheel])]);
        let mut registry = MaterialRegistry::new();
        let report = classify(&root, &mut registry);
        assert!(registry.is_empty(PartCategory::Rim));
        assert_eq!(report.meshes_visited, 1);
    }
}
