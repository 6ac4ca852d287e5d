//! HTTP request handlers

pub mod media;

pub use media::router;
