//! # sf-core
//!
//! Core pipeline engine and model gateway for sdlc-factory.
//!
//! This crate provides:
//! - Configuration loading from the `.sdlc-factory/` directory
//! - A model gateway abstraction with one adapter per provider
//! - A response decoder that recovers structured results from free text
//! - The pipeline engine that runs the stage sequence
//! - Project state management and history persistence
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`gateway`]: Gateway trait and provider adapters
//! - [`decoder`]: Recovery strategies and placeholders
//! - [`engine`]: Pipeline execution engine and prompt construction
//! - [`state`]: Project state machine and the project manager
//! - [`storage`]: History snapshots
//! - [`init`]: Scaffolding for `factory init`

pub mod config;
pub mod decoder;
pub mod engine;
pub mod gateway;
pub mod init;
pub mod state;
pub mod storage;
