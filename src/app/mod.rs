// logsplit - app/mod.rs
//
// Application layer: batch orchestration on top of the core engine.

pub mod batch;
