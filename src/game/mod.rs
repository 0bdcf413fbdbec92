pub mod components;
pub mod events;
pub mod modifiers;
pub mod options;
pub mod roles;
pub mod status;
pub mod types;
