//! Analysis use-case: quota gating, inference, commit.

mod run_analysis;

pub use run_analysis::{
    AnalysisError, AnalysisInput, AnalysisOutcome, AnalysisService, ChargeOutcome, RequestIdentity,
};
