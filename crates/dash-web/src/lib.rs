pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod diag;
pub mod dump;
pub mod error;
pub mod layout;
pub mod params;
pub mod reqlog;
pub mod server;
pub mod service;
pub mod store;
pub mod util;
pub mod views;
