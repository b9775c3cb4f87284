// htmlscrub/src/lib.rs
//! # htmlscrub CLI Application
//!
//! This crate provides the command-line front end for `htmlscrub-core`: it loads
//! purifier settings, sanitizes JSON request bodies, and inspects profiles and
//! assembled configurations.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
