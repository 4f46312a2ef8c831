//! rlspad: a terminal playground for authoring Postgres row-level
//! security policies.
//!
//! Scripts in a small expression language drive a fluent policy builder
//! and must return the rendered SQL string. [`execution::execute`] is the
//! one-shot entry point; [`tui`] wraps it in an interactive editor with
//! completion backed by bundled type declarations.

pub mod assist;
pub mod bindings;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod execution;
pub mod handlers;
pub mod printer;
pub mod script;
pub mod session;
pub mod tui;
