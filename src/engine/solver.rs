// ==========================================
// 合金配料系统 - 线性规划求解器接口
// ==========================================
// 标准形式: min cᵀx  s.t.  Ax {=,≤,≥} b,  x ≥ 0
// 红线: 求解器可替换，Builder / Interpreter 不依赖具体算法
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// ConstraintSense - 约束方向
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
}

// ==========================================
// LinearConstraint - 单条线性约束
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub label: String,          // 约束标识（如 "sum_to_one"、"Si>=min"）
    pub coefficients: Vec<f64>, // 长度 = 变量数
    pub sense: ConstraintSense,
    pub rhs: f64,
}

// ==========================================
// LinearProgram - 最小化问题
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearProgram {
    pub objective: Vec<f64>,
    pub constraints: Vec<LinearConstraint>,
}

impl LinearProgram {
    pub fn variable_count(&self) -> usize {
        self.objective.len()
    }

    /// 结构校验：每条约束系数长度一致、数值有限
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.variable_count();
        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(SolverError::MalformedProblem("目标系数含非有限值".to_string()));
        }
        for constraint in &self.constraints {
            if constraint.coefficients.len() != n {
                return Err(SolverError::MalformedProblem(format!(
                    "约束 {} 系数长度 {} != 变量数 {}",
                    constraint.label,
                    constraint.coefficients.len(),
                    n
                )));
            }
            if !constraint.rhs.is_finite() || constraint.coefficients.iter().any(|c| !c.is_finite()) {
                return Err(SolverError::MalformedProblem(format!(
                    "约束 {} 含非有限值",
                    constraint.label
                )));
            }
        }
        Ok(())
    }
}

// ==========================================
// 求解结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpSolution {
    pub values: Vec<f64>,
    pub objective_value: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverOutcome {
    Optimal(LpSolution),
    Infeasible,
}

/// 求解器内部失败（不同于"不可行"）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("问题结构错误: {0}")]
    MalformedProblem(String),

    #[error("目标函数无界")]
    Unbounded,

    #[error("超过最大迭代次数: {0}")]
    IterationLimit(usize),
}

// ==========================================
// BlendSolver - 可插拔求解器
// ==========================================
pub trait BlendSolver: Send + Sync {
    fn solve(&self, problem: &LinearProgram) -> Result<SolverOutcome, SolverError>;
}
