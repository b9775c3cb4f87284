// htmlscrub/src/ui/mod.rs
//! Terminal presentation helpers.

pub mod output_format;
