// htmlscrub-core/src/engines/mod.rs
//! Concrete `Purifier` implementations.
//!
//! Each engine lives in its own file and implements the `Purifier` trait. The
//! `compiler` module turns an assembled configuration into the form the ammonia
//! engine consumes and caches it by grammar identity.
//!
//! # License
//! MIT OR APACHE 2.0

pub mod ammonia_engine;
pub mod compiler;
