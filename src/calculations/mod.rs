pub mod forward_pass;
pub mod optimizer;

pub use forward_pass::ForwardPass;
pub use optimizer::{OptimizationOutcome, OptimizationReport, Optimizer, parallel_pairs};
