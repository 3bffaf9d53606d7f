#![forbid(unsafe_code)]

pub mod auth;
pub mod memory;
pub mod repository;
pub mod sqlite;
