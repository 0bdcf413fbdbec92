use bevy::prelude::Entity;
use thiserror::Error;

use crate::game::types::ModifierId;

/// Everything that can go wrong at the modifier collection boundary.
///
/// None of these abort a tick: the collection logs them and the request is a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModifierError {
    #[error("modifier kind {kind} is already registered with id {id}")]
    DuplicateRegistration { kind: &'static str, id: ModifierId },

    #[error("modifier registry is sealed, cannot register {kind}")]
    RegistrySealed { kind: &'static str },

    #[error("modifier {kind} is not registered")]
    UnregisteredKind { kind: String },

    #[error("entity {entity} already has modifier {name} (id {id})")]
    AlreadyActive {
        entity: Entity,
        id: ModifierId,
        name: String,
    },

    #[error("modifier {target} is not active on entity {entity}")]
    NotActive { entity: Entity, target: String },

    #[error("could not construct modifier {kind}: {details}")]
    ConstructionFailure { kind: String, details: String },

    #[error("entity {entity} has no modifier collection")]
    MissingCollection { entity: Entity },

    #[error("timer already started")]
    TimerAlreadyStarted,

    #[error("timer already completed")]
    TimerCompleted,

    #[error("modifier {modifier} failed: {details}")]
    Hook { modifier: String, details: String },
}

pub type ModifierResult<T> = Result<T, ModifierError>;
