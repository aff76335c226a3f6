//! Marigold Core - Shared types library.
//!
//! This crate provides common types used across the Marigold workspace:
//! - `storefront` - Server-rendered storefront over the demo catalog service
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and email addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
