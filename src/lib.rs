// logsplit - lib.rs
//
// Library entry point exposing the layered module tree:
//   core - pattern compilation, segmentation, classification, routing
//   app  - batch orchestration and merge
//   util - constants, errors, logging setup

pub mod app;
pub mod core;
pub mod util;
