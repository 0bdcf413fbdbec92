use std::any::TypeId;
use std::collections::HashMap;

use bevy::prelude::*;

use super::error::{ModifierError, ModifierResult};
use super::modifier::{Modifier, ModifierKind};
use crate::game::types::ModifierId;

/// Builds a default instance of a kind for add-by-kind / add-by-id requests.
pub type ModifierFactory = fn() -> Box<dyn Modifier>;

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub id: ModifierId,
    pub kind: ModifierKind,
    pub factory: Option<ModifierFactory>,
}

/// Session-wide mapping between modifier kinds and their compact ids.
///
/// Ids are handed out from 1 in registration order, so every peer must register the
/// same kinds in the same order. Registration is append-only and stops once the
/// registry is sealed at the end of startup.
#[derive(Resource, Debug, Default)]
pub struct ModifierRegistry {
    by_type: HashMap<TypeId, ModifierId>,
    entries: Vec<RegistryEntry>,
    sealed: bool,
}

impl ModifierRegistry {
    /// Register a kind that can also be constructed by id.
    pub fn register<M: Modifier + Default>(&mut self) -> ModifierResult<ModifierId> {
        self.register_kind(ModifierKind::of::<M>(), Some(construct_default::<M>))
    }

    /// Register a kind that can only be attached as a prepared instance.
    pub fn register_instance_only<M: Modifier>(&mut self) -> ModifierResult<ModifierId> {
        self.register_kind(ModifierKind::of::<M>(), None)
    }

    pub fn register_kind(
        &mut self,
        kind: ModifierKind,
        factory: Option<ModifierFactory>,
    ) -> ModifierResult<ModifierId> {
        if let Some(&id) = self.by_type.get(&kind.type_id()) {
            return Err(ModifierError::DuplicateRegistration {
                kind: kind.name(),
                id,
            });
        }
        if self.sealed {
            return Err(ModifierError::RegistrySealed { kind: kind.name() });
        }

        let id = ModifierId(self.entries.len() as u32 + 1);
        self.by_type.insert(kind.type_id(), id);
        self.entries.push(RegistryEntry { id, kind, factory });
        debug!("Registered modifier {kind} as id {id}");
        Ok(id)
    }

    pub fn id_of(&self, kind: &ModifierKind) -> Option<ModifierId> {
        self.by_type.get(&kind.type_id()).copied()
    }

    pub fn id_of_type<M: Modifier>(&self) -> Option<ModifierId> {
        self.by_type.get(&TypeId::of::<M>()).copied()
    }

    pub fn kind_of(&self, id: ModifierId) -> Option<ModifierKind> {
        self.entry(id).map(|e| e.kind)
    }

    pub fn entry(&self, id: ModifierId) -> Option<&RegistryEntry> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.entries.get(index)
    }

    /// Default-construct the kind registered under `id`.
    pub fn construct(&self, id: ModifierId) -> ModifierResult<(ModifierKind, Box<dyn Modifier>)> {
        let entry = self.entry(id).ok_or_else(|| ModifierError::UnregisteredKind {
            kind: format!("#{id}"),
        })?;
        let factory = entry
            .factory
            .ok_or_else(|| ModifierError::ConstructionFailure {
                kind: entry.kind.name().to_string(),
                details: "kind has no default constructor".into(),
            })?;
        Ok((entry.kind, factory()))
    }

    /// Stop accepting registrations. Ids are final from here on.
    pub fn seal(&mut self) {
        if !self.sealed {
            info!("Modifier registry sealed with {} kinds", self.entries.len());
        }
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }
}

fn construct_default<M: Modifier + Default>() -> Box<dyn Modifier> {
    Box::new(M::default())
}

/// Seals the registry once startup registration is done.
pub(crate) fn seal_registry(mut registry: ResMut<ModifierRegistry>) {
    registry.seal();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Freeze;
    impl Modifier for Freeze {
        fn name(&self) -> &str {
            "Freeze"
        }
    }

    #[derive(Default)]
    struct Haste;
    impl Modifier for Haste {
        fn name(&self) -> &str {
            "Haste"
        }
    }

    struct Marked(#[allow(dead_code)] u32);
    impl Modifier for Marked {
        fn name(&self) -> &str {
            "Marked"
        }
    }

    #[test]
    fn ids_start_at_one_in_registration_order() {
        let mut reg = ModifierRegistry::default();
        assert_eq!(reg.register::<Freeze>(), Ok(ModifierId(1)));
        assert_eq!(reg.register::<Haste>(), Ok(ModifierId(2)));
        assert_eq!(reg.id_of_type::<Freeze>(), Some(ModifierId(1)));
        assert_eq!(reg.kind_of(ModifierId(2)), Some(ModifierKind::of::<Haste>()));
        assert_eq!(reg.kind_of(ModifierId(0)), None);
        assert_eq!(reg.kind_of(ModifierId(3)), None);
    }

    #[test]
    fn duplicate_registration_keeps_first_id() {
        let mut reg = ModifierRegistry::default();
        reg.register::<Freeze>().unwrap();
        reg.register::<Haste>().unwrap();

        let err = reg.register::<Freeze>().unwrap_err();
        assert_eq!(
            err,
            ModifierError::DuplicateRegistration { kind: "Freeze", id: ModifierId(1) }
        );
        assert_eq!(reg.id_of_type::<Freeze>(), Some(ModifierId(1)));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn sealed_registry_rejects_new_kinds() {
        let mut reg = ModifierRegistry::default();
        reg.register::<Freeze>().unwrap();
        reg.seal();
        assert_eq!(
            reg.register::<Haste>(),
            Err(ModifierError::RegistrySealed { kind: "Haste" })
        );
        assert_eq!(reg.id_of_type::<Haste>(), None);
    }

    #[test]
    fn construct_requires_factory() {
        let mut reg = ModifierRegistry::default();
        let freeze = reg.register::<Freeze>().unwrap();
        let marked = reg.register_instance_only::<Marked>().unwrap();

        let (kind, modifier) = reg.construct(freeze).unwrap();
        assert_eq!(kind, ModifierKind::of::<Freeze>());
        assert_eq!(modifier.name(), "Freeze");

        assert!(matches!(
            reg.construct(marked),
            Err(ModifierError::ConstructionFailure { .. })
        ));
        assert!(matches!(
            reg.construct(ModifierId(9)),
            Err(ModifierError::UnregisteredKind { .. })
        ));
    }
}
