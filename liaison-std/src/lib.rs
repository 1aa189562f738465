//! # liaison-std
//!
//! Standard implementations for the Liaison in-process mediator.
//!
//! This crate provides:
//! - **Service container**: [`ServiceCollection`], [`ServiceProvider`] and
//!   [`Lifetime`], the dependency-injection collaborator the registration
//!   engine writes into and the mediator resolves from
//! - **Standard behaviors**: Logging, Tracing, Timeout
//! - **Testing utilities**: recording, counting and failing handlers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use liaison_core;

// Modules
pub mod behaviors;
pub mod container;
pub mod testing;

pub use container::{Lifetime, Resolved, ServiceCollection, ServiceDescriptor, ServiceProvider};
