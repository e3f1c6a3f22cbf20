use glam::Vec3;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Mutable surface description attached to mesh nodes.
///
/// `emissive` and `clearcoat` are capabilities: `None` means the material model has no such
/// property and writers must leave it alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub label: String,
    pub base_color: Vec3,
    pub opacity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: Option<Vec3>,
    pub clearcoat: Option<f32>,
    needs_update: bool,
}

impl Material {
    /// Metal/rough material with an emissive term and no clearcoat layer.
    pub fn standard(label: impl Into<String>, base_color: Vec3, metalness: f32, roughness: f32) -> Self {
        Self {
            label: label.into(),
            base_color,
            opacity: 1.0,
            metalness,
            roughness,
            emissive: Some(Vec3::ZERO),
            clearcoat: None,
            needs_update: false,
        }
    }

    /// Unlit-style material without emissive or clearcoat support.
    pub fn basic(label: impl Into<String>, base_color: Vec3) -> Self {
        Self {
            label: label.into(),
            base_color,
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            emissive: None,
            clearcoat: None,
            needs_update: false,
        }
    }

    /// glTF default material: white, fully metallic, fully rough.
    pub fn gltf_default() -> Self {
        Self::standard("Default", Vec3::ONE, 1.0, 1.0)
    }

    pub fn with_emissive(mut self, emissive: Vec3) -> Self {
        self.emissive = Some(emissive);
        self
    }

    pub fn with_clearcoat(mut self, clearcoat: f32) -> Self {
        self.clearcoat = Some(clearcoat);
        self
    }

    pub fn supports_emissive(&self) -> bool {
        self.emissive.is_some()
    }

    pub fn supports_clearcoat(&self) -> bool {
        self.clearcoat.is_some()
    }

    /// Only basic materials lack an emissive term; they render unlit.
    pub fn is_lit(&self) -> bool {
        self.emissive.is_some()
    }

    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Clears and returns the render-state refresh flag.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }
}

/// Shared reference to a [`Material`]; clones alias the same material.
#[derive(Clone)]
pub struct MaterialHandle(Rc<RefCell<Material>>);

impl MaterialHandle {
    pub fn new(material: Material) -> Self {
        Self(Rc::new(RefCell::new(material)))
    }

    pub fn borrow(&self) -> Ref<'_, Material> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Material> {
        self.0.borrow_mut()
    }

    pub fn same_material(&self, other: &MaterialHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn snapshot(&self) -> Material {
        self.0.borrow().clone()
    }
}

impl fmt::Debug for MaterialHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(material) => f.debug_tuple("MaterialHandle").field(&material.label).finish(),
            Err(_) => f.write_str("MaterialHandle(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_alias_the_same_material() {
        let a = MaterialHandle::new(Material::standard("paint", Vec3::ONE, 0.0, 1.0));
        let b = a.clone();
        b.borrow_mut().base_color = Vec3::X;
        assert_eq!(a.borrow().base_color, Vec3::X);
        assert!(a.same_material(&b));
        let c = MaterialHandle::new(a.snapshot());
        assert!(!a.same_material(&c));
    }

    #[test]
    fn capabilities_follow_material_model() {
        let standard = Material::standard("s", Vec3::ONE, 0.0, 1.0);
        assert!(standard.supports_emissive());
        assert!(!standard.supports_clearcoat());
        let physical = standard.clone().with_clearcoat(0.0);
        assert!(physical.supports_clearcoat());
        let basic = Material::basic("b", Vec3::ONE);
        assert!(!basic.supports_emissive());
        assert!(!basic.supports_clearcoat());
    }

    #[test]
    fn needs_update_is_taken_once() {
        let mut material = Material::gltf_default();
        assert!(!material.needs_update());
        material.mark_needs_update();
        assert!(material.take_needs_update());
        assert!(!material.take_needs_update());
    }
}
