//! # tracksheet_core
//!
//! Core domain logic for Tracksheet: identity, session and authorization
//! components, the sheet/template/problem models and services, and the
//! persistence layer they share.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod services;
pub mod store;
