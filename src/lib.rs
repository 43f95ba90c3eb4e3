//! Surf raid log and beach view API.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod services;
