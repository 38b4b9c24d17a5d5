//! Mix groups: named provider subsets with their own combination strategy.

pub mod group;
pub mod registry;
pub mod strategy;

pub use group::{MixGroup, MixMember};
pub use registry::MixGroupRegistry;
pub use strategy::MixStrategy;
