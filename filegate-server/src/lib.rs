//! The file gateway server component.
//!
//! This builds on top of [`filegate_service`], and exposes the storage and
//! account layer as an `HTTP` API which can serve files directly to
//! *external clients*.

pub mod auth;
pub mod cli;
pub mod config;
pub mod endpoints;
pub mod extractors;
pub mod healthcheck;
pub mod observability;
pub mod state;
pub mod web;
