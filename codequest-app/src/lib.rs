pub mod domain;

#[cfg(feature = "client")]
pub mod config;

#[cfg(feature = "client")]
pub mod application;

#[cfg(feature = "client")]
pub mod infrastructure;

#[cfg(feature = "client")]
mod app_context;

#[cfg(feature = "client")]
pub use app_context::AppContext;
