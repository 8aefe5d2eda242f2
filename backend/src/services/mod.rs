//! Cost engine services

pub mod budget;
pub mod cost_flow;
pub mod efficiency;
pub mod export;
pub mod pipeline;
pub mod procurement_cost;
pub mod reconciliation;
pub mod variance;

pub use budget::{BudgetLocks, BudgetService};
pub use cost_flow::CostFlowService;
pub use efficiency::EfficiencyService;
pub use pipeline::CostPipeline;
pub use procurement_cost::ProcurementCostService;
pub use reconciliation::ReconciliationService;
pub use variance::VarianceService;
