//! ProdVision - production status dashboard backend

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod query;
pub mod validation;
