pub mod freeze;

pub use freeze::FreezeModifier;
