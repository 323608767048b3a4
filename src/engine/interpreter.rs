// ==========================================
// 合金配料系统 - 配方解释器
// ==========================================
// 输入: 求解结果 + 变量（可用原料）列表
// 输出: Recipe（占比保留两位小数 + 每 kg 成本）
// 说明: 四舍五入带来的 < 0.01 合计偏差不做修正
// ==========================================

use crate::domain::recipe::{Recipe, RecipeLine};
use crate::engine::error::{BlendError, BlendResult};
use crate::engine::model_builder::BlendVariable;
use crate::engine::solver::SolverOutcome;
use serde::{Deserialize, Serialize};

/// 求解器噪声阈值
pub const DEFAULT_SOLUTION_EPSILON: f64 = 1e-9;

/// 占比 / 成本保留小数位
pub const DEFAULT_PERCENTAGE_DECIMALS: u32 = 2;

// ==========================================
// RecipePolicy - 取整策略
// ==========================================
// 执行阶段直接使用配方中的占比扣减库存，两处口径一致
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecipePolicy {
    pub epsilon: f64,
    pub decimals: u32,
}

impl Default for RecipePolicy {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_SOLUTION_EPSILON,
            decimals: DEFAULT_PERCENTAGE_DECIMALS,
        }
    }
}

impl RecipePolicy {
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (value * factor).round() / factor
    }
}

// ==========================================
// RecipeInterpreter
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RecipeInterpreter {
    policy: RecipePolicy,
}

impl RecipeInterpreter {
    pub fn new(policy: RecipePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RecipePolicy {
        self.policy
    }

    /// 解释求解结果
    ///
    /// # 错误
    /// - NoFeasibleRecipe: 求解器判定不可行
    /// - SolverFailure: 结果与变量列表不一致
    pub fn interpret(
        &self,
        outcome: &SolverOutcome,
        variables: &[BlendVariable],
    ) -> BlendResult<Recipe> {
        let solution = match outcome {
            SolverOutcome::Optimal(solution) => solution,
            SolverOutcome::Infeasible => {
                return Err(BlendError::NoFeasibleRecipe(format!(
                    "{} 种可用原料在当前单价下无法满足成分上下限",
                    variables.len()
                )))
            }
        };

        if solution.values.len() != variables.len() {
            return Err(BlendError::SolverFailure(format!(
                "解向量长度 {} 与变量数 {} 不一致",
                solution.values.len(),
                variables.len()
            )));
        }

        let mut lines = Vec::new();
        let mut cost = 0.0;
        for (value, variable) in solution.values.iter().zip(variables) {
            if *value <= self.policy.epsilon {
                continue;
            }
            // 占比取整为 0 的行不进入配方，也不计入成本
            let percentage = self.policy.round(value * 100.0);
            if percentage <= 0.0 {
                continue;
            }
            lines.push(RecipeLine {
                material_name: variable.material_name.clone(),
                percentage,
            });
            cost += value * variable.unit_price;
        }

        Ok(Recipe {
            lines,
            total_cost: self.policy.round(cost),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::solver::LpSolution;

    fn variables() -> Vec<BlendVariable> {
        ["A", "B", "C"]
            .iter()
            .zip([10.0, 2.0, 5.0])
            .map(|(name, price)| BlendVariable {
                material_id: format!("id-{}", name),
                material_name: name.to_string(),
                unit_price: price,
            })
            .collect()
    }

    fn optimal(values: Vec<f64>) -> SolverOutcome {
        SolverOutcome::Optimal(LpSolution {
            values,
            objective_value: 0.0,
            iterations: 0,
        })
    }

    #[test]
    fn test_interpret_rounds_and_costs() {
        let recipe = RecipeInterpreter::default()
            .interpret(&optimal(vec![0.3, 0.7, 0.0]), &variables())
            .unwrap();

        assert_eq!(
            recipe.lines,
            vec![RecipeLine::new("A", 30.0), RecipeLine::new("B", 70.0)]
        );
        assert_eq!(recipe.total_cost, 4.4);
    }

    #[test]
    fn test_interpret_suppresses_solver_noise() {
        let recipe = RecipeInterpreter::default()
            .interpret(&optimal(vec![1e-12, 1.0 - 1e-12, 0.0]), &variables())
            .unwrap();
        assert_eq!(recipe.lines, vec![RecipeLine::new("B", 100.0)]);
        assert_eq!(recipe.total_cost, 2.0);
    }

    #[test]
    fn test_interpret_rounding_discrepancy_not_corrected() {
        let third = 1.0 / 3.0;
        let recipe = RecipeInterpreter::default()
            .interpret(&optimal(vec![third, third, third]), &variables())
            .unwrap();
        assert_eq!(recipe.lines.len(), 3);
        assert!(recipe.lines.iter().all(|l| l.percentage == 33.33));
        assert!((recipe.total_percentage() - 99.99).abs() < 1e-9);
        assert_eq!(recipe.total_cost, 5.67);
    }

    #[test]
    fn test_interpret_dropped_line_excluded_from_cost() {
        let vars: Vec<BlendVariable> = [("Cheap", 1.0), ("Dear", 1000.0)]
            .iter()
            .map(|(name, price)| BlendVariable {
                material_id: format!("id-{}", name),
                material_name: name.to_string(),
                unit_price: *price,
            })
            .collect();

        let recipe = RecipeInterpreter::default()
            .interpret(&optimal(vec![0.99996, 0.00004]), &vars)
            .unwrap();

        assert_eq!(recipe.lines, vec![RecipeLine::new("Cheap", 100.0)]);
        assert_eq!(recipe.total_cost, 1.0);
    }

    #[test]
    fn test_interpret_infeasible() {
        let result = RecipeInterpreter::default().interpret(&SolverOutcome::Infeasible, &variables());
        assert!(matches!(result, Err(BlendError::NoFeasibleRecipe(_))));
    }

    #[test]
    fn test_interpret_length_mismatch() {
        let result = RecipeInterpreter::default().interpret(&optimal(vec![1.0]), &variables());
        assert!(matches!(result, Err(BlendError::SolverFailure(_))));
    }
}
