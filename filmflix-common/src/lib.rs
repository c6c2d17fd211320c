//! # Filmflix Common Library
//!
//! Catalog core shared by the Filmflix service binaries:
//! - Document store abstraction and its SQLite backend
//! - Film / actor / director models and typed repositories
//! - Reference validation and reverse-reference synchronization
//! - The catalog service that ties them together
//! - Configuration loading

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod id_utils;
pub mod models;
pub mod repository;
pub mod set_diff;
pub mod store;
pub mod sync;
pub mod validator;

pub use error::{Error, Result, ValidationError};
