// src/lib.rs

//! skycrawl: Bluesky account sampler and engagement profiler library

pub mod api;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
