// Library root — the Habitat client SDK. The `habitat` CLI lives in src/main.rs.

pub mod api;
pub mod config;
pub mod context;
pub mod debugger;
pub mod did;
pub mod error;
pub mod logger;
pub mod sdk;
pub mod session;
