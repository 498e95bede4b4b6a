//! Core domain types shared by the pack and unpack pipelines.

pub mod errors;
pub mod model;
