pub mod jsonl;
pub mod memory;
pub mod sink;
pub mod store;
