#![allow(dead_code)]

pub mod apps;
pub mod events;
