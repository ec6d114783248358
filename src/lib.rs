pub mod app;
pub mod command;
pub mod config;
pub mod constants;
pub mod context;
pub mod email;
pub mod error;
pub mod lock;
pub mod logger;
pub mod ping;
pub mod registry;
pub mod store;
pub mod sync;
