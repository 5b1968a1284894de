//! Rule engine: findings over the extracted procedures and routers.
//!
//! Rules are plain values (an id, a severity and a check function) kept in
//! an ordered [`RuleSet`]. Procedure rules run once per procedure, router
//! rules once per router, and findings come out in evaluation order.

mod engine;
mod procedure;
mod router;
mod types;

pub use engine::{AnalysisContext, Rule, RuleInfo, RuleSet, RuleSubject, Thresholds};
pub use procedure::default_procedure_rules;
pub use router::default_router_rules;
pub use types::{Finding, Severity, Summary};
