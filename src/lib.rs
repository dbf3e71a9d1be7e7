// Library surface for the data core; the admin CLI lives in main.rs.
// Keep this lean: record types, validity rules, export, storage, config.
pub mod app_dirs;
pub mod config;
pub mod export;
pub mod sampling;
pub mod session;
pub mod store;
pub mod summary;
pub mod validate;
