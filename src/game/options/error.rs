use thiserror::Error;

use crate::game::types::OptionId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionError {
    #[error("option group {0} is already registered")]
    DuplicateGroup(String),

    #[error("option {option} appears twice in group {group}")]
    DuplicateOption { group: String, option: String },

    #[error("option {0} is not registered")]
    UnknownOption(OptionId),

    #[error("option {id} holds a {expected} value")]
    KindMismatch { id: OptionId, expected: &'static str },

    #[error("option {id} has {len} choices, index {index} is out of range")]
    EnumOutOfRange { id: OptionId, index: usize, len: usize },

    #[error("option {id} got a malformed payload of {len} bytes")]
    Malformed { id: OptionId, len: usize },

    #[error("option storage: {0}")]
    Storage(String),
}

pub type OptionResult<T> = Result<T, OptionError>;
