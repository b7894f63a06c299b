//! Core module - request builder and live preview engine
//!
//! Leaf-first: catalog → query/snippet → suggest/editor → preview → session.
//! `fetch` is the seam to the network and the filesystem.

pub mod catalog;
pub mod editor;
pub mod fetch;
pub mod preview;
pub mod query;
pub mod session;
pub mod snippet;
pub mod suggest;
