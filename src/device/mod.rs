pub mod scripted;
pub mod source;
