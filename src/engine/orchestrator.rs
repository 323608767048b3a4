// ==========================================
// 合金配料系统 - 优化编排器
// ==========================================
// 主流程: 成分要求 + 目录快照 → 建模 → 求解 → 解释 → Recipe
// 红线: 只读，不触碰库存
// ==========================================

use crate::config::BlendConfigReader;
use crate::domain::material::Material;
use crate::domain::recipe::Recipe;
use crate::domain::requirement::RequirementSet;
use crate::engine::error::{BlendError, BlendResult};
use crate::engine::interpreter::{RecipeInterpreter, RecipePolicy};
use crate::engine::model_builder::ConstraintModelBuilder;
use crate::engine::simplex::DenseSimplexSolver;
use crate::engine::solver::BlendSolver;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

// ==========================================
// BlendOrchestrator - 优化编排器
// ==========================================
pub struct BlendOrchestrator {
    builder: ConstraintModelBuilder,
    solver: Box<dyn BlendSolver>,
    interpreter: RecipeInterpreter,
}

impl Default for BlendOrchestrator {
    fn default() -> Self {
        Self::new(Box::new(DenseSimplexSolver::default()), RecipePolicy::default())
    }
}

impl BlendOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - solver: 线性规划求解器（可替换）
    /// - policy: 配方取整策略
    pub fn new(solver: Box<dyn BlendSolver>, policy: RecipePolicy) -> Self {
        Self {
            builder: ConstraintModelBuilder::new(),
            solver,
            interpreter: RecipeInterpreter::new(policy),
        }
    }

    /// 按配置创建（单纯形求解器）
    pub fn from_config<C: BlendConfigReader + ?Sized>(config: &C) -> Result<Self, Box<dyn Error>> {
        let policy = RecipePolicy {
            epsilon: config.get_solution_epsilon()?,
            decimals: config.get_percentage_decimals()?,
        };
        let solver = DenseSimplexSolver::new(config.get_solver_max_iterations()?);
        Ok(Self::new(Box::new(solver), policy))
    }

    pub fn policy(&self) -> RecipePolicy {
        self.interpreter.policy()
    }

    /// 计算最低成本配方
    ///
    /// # 错误
    /// - InvalidRequirement: 成分要求非法
    /// - NoFeasibleRecipe: 可用原料无法满足要求（含目录为空）
    /// - SolverFailure: 求解器内部失败
    #[instrument(skip(self, requirements, catalog), fields(elements = requirements.len(), catalog = catalog.len()))]
    pub fn optimize(&self, requirements: &RequirementSet, catalog: &[Material]) -> BlendResult<Recipe> {
        let problem = self.builder.build(requirements, catalog)?;

        let outcome = self.solver.solve(&problem.program).map_err(|e| {
            warn!(error = %e, "求解器失败");
            BlendError::SolverFailure(e.to_string())
        })?;
        debug!(?outcome, "求解完成");

        let recipe = self.interpreter.interpret(&outcome, &problem.variables)?;
        info!(lines = recipe.lines.len(), total_cost = recipe.total_cost, "配方计算完成");
        Ok(recipe)
    }
}
