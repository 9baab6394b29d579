//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, platform
//! detection, content fetching, configuration and scratch-file management.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod descriptors;
pub mod fetcher;
pub mod platform;
pub mod probe;
pub mod process_runner;
pub mod scratch;
