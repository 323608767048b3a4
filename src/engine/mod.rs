// ==========================================
// 合金配料系统 - 引擎层
// ==========================================
// 职责: 配料建模、求解、配方解释、投料执行协调
// 红线: Engine 不拼 SQL，存储访问只经 repository 层的 trait
// ==========================================

pub mod commit;
pub mod error;
pub mod interpreter;
pub mod model_builder;
pub mod orchestrator;
pub mod simplex;
pub mod solver;

// 重导出核心引擎
pub use commit::{ExecutionReceipt, ExecutionRequest, InventoryCommitCoordinator};
pub use error::{BlendError, BlendResult};
pub use interpreter::{RecipeInterpreter, RecipePolicy};
pub use model_builder::{BlendProblem, BlendVariable, ConstraintModelBuilder};
pub use orchestrator::BlendOrchestrator;
pub use simplex::DenseSimplexSolver;
pub use solver::{
    BlendSolver, ConstraintSense, LinearConstraint, LinearProgram, LpSolution, SolverError,
    SolverOutcome,
};
