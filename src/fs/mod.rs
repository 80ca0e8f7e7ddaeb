pub mod arena;
pub mod flatten;
pub mod hydrate;
pub mod local;
pub mod node;
pub mod order;
pub mod places;
pub mod provider;
pub mod tree;
