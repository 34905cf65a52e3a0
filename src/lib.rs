//! popit: a read-oriented content API over a WordPress store.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
