pub mod executor;
pub mod stage1_parse;
pub mod stage2_index;
pub mod stage3_route;
pub mod stage4_flags;
pub mod stage4_metric;
pub mod stage4_retrieve;
pub mod stage5_artifacts;
pub mod stage6_synthesize;
pub mod stage7_confidence;
