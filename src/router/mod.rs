pub mod config;
pub mod debounce;
pub mod handler;
pub mod metrics;
pub mod policy;
pub(crate) mod queue;
pub mod router;
pub mod router_model;
pub mod stream;
