//! To-do list backend library
//!
//! Exposes the store, authorization guard and HTTP router for use by the
//! server binary and tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod models;
pub mod store;
