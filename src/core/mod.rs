// logsplit - core/mod.rs
//
// Core processing logic: pattern compilation, entry segmentation,
// classification, dedup, filtering, and output routing.

pub mod classify;
pub mod dedup;
pub mod filter;
pub mod model;
pub mod patterns;
pub mod router;
pub mod splitter;
