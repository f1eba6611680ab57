//! Core library modules for butterfly-mirror
//!
//! This module contains the internal implementation of each pipeline stage.

pub mod config;
pub mod downloader;
pub mod env_file;
pub mod error;
pub mod freshness;
pub mod merge;
pub mod pipeline;
pub mod source;
pub mod stream;
pub mod upload;
