//! Remote module
//!
//! Concrete implementations of the fetch seam: an HTTP fetcher backed by
//! reqwest and a saver that writes downloads to disk.

mod client;
mod saver;

pub use client::ReqwestFetcher;
pub use saver::DiskSaver;
