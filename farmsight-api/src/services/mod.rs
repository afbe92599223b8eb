//! Service layer: pipeline orchestration and decision logic

pub mod pipeline;
pub mod recommendation;
pub mod seed;
pub mod thresholds;
pub mod weather;
