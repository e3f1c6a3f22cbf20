use crate::material::MaterialHandle;
use crate::part::{PartCategory, StorageArity};

/// Classified material references for one category.
#[derive(Debug, Clone)]
pub enum RegistryEntry {
    Single(Option<MaterialHandle>),
    Collection(Vec<MaterialHandle>),
}

impl RegistryEntry {
    fn for_arity(arity: StorageArity) -> Self {
        match arity {
            StorageArity::Single => RegistryEntry::Single(None),
            StorageArity::Collection => RegistryEntry::Collection(Vec::new()),
        }
    }

    pub fn materials(&self) -> &[MaterialHandle] {
        match self {
            RegistryEntry::Single(Some(handle)) => std::slice::from_ref(handle),
            RegistryEntry::Single(None) => &[],
            RegistryEntry::Collection(handles) => handles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.materials().is_empty()
    }
}

/// Material references keyed by part category.
///
/// Entries only grow: a single slot is overwritten by the latest match, a collection appends.
/// Nothing clears or reclassifies an entry once written.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    entries: [RegistryEntry; PartCategory::COUNT],
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self { entries: PartCategory::ALL.map(|category| RegistryEntry::for_arity(category.arity())) }
    }

    pub fn record(&mut self, category: PartCategory, material: MaterialHandle) {
        match &mut self.entries[category.index()] {
            RegistryEntry::Single(slot) => *slot = Some(material),
            RegistryEntry::Collection(handles) => handles.push(material),
        }
    }

    pub fn entry(&self, category: PartCategory) -> &RegistryEntry {
        &self.entries[category.index()]
    }

    pub fn materials(&self, category: PartCategory) -> &[MaterialHandle] {
        self.entry(category).materials()
    }

    pub fn len(&self, category: PartCategory) -> usize {
        self.materials(category).len()
    }

    pub fn is_empty(&self, category: PartCategory) -> bool {
        self.entry(category).is_empty()
    }

    pub fn total(&self) -> usize {
        PartCategory::ALL.iter().map(|category| self.len(*category)).sum()
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use glam::Vec3;

    fn handle(label: &str) -> MaterialHandle {
        MaterialHandle::new(Material::standard(label, Vec3::ONE, 0.0, 1.0))
    }

    #[test]
    fn starts_empty_for_every_category() {
        let registry = MaterialRegistry::new();
        for category in PartCategory::ALL {
            assert!(registry.is_empty(category));
        }
        assert_eq!(registry.total(), 0);
    }

    #[test]
    fn single_slot_keeps_last_write() {
        let mut registry = MaterialRegistry::new();
        let first = handle("seat_a");
        let second = handle("seat_b");
        registry.record(PartCategory::Seat, first);
        registry.record(PartCategory::Seat, second.clone());
        assert_eq!(registry.len(PartCategory::Seat), 1);
        assert!(registry.materials(PartCategory::Seat)[0].same_material(&second));
    }

    #[test]
    fn collection_appends_in_order_with_duplicates() {
        let mut registry = MaterialRegistry::new();
        let a = handle("disc_a");
        let b = handle("disc_b");
        registry.record(PartCategory::BrakeDisc, a.clone());
        registry.record(PartCategory::BrakeDisc, b.clone());
        registry.record(PartCategory::BrakeDisc, a.clone());
        let stored = registry.materials(PartCategory::BrakeDisc);
        assert_eq!(stored.len(), 3);
        assert!(stored[0].same_material(&a));
        assert!(stored[1].same_material(&b));
        assert!(stored[2].same_material(&a));
        assert!(matches!(registry.entry(PartCategory::BrakeDisc), RegistryEntry::Collection(_)));
        assert!(matches!(registry.entry(PartCategory::Body), RegistryEntry::Single(None)));
    }
}
