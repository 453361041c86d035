//! Core translation and merge functionality

pub mod client;
pub mod config;
pub mod errors;
pub mod merge;
pub mod models;
