pub mod evaluator;
pub mod types;

pub use evaluator::RiskEvaluator;
pub use types::{RiskReason, RiskVerdict, TaxBand};
