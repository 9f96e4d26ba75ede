pub mod classifier;
pub mod intent;
pub mod screen_model;
