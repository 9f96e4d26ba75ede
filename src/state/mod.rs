pub mod diff;
pub mod identity;
pub mod normalize;
pub mod state_builder;
pub mod state_model;
