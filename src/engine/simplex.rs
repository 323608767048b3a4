// ==========================================
// 合金配料系统 - 稠密单纯形求解器
// ==========================================
// 算法: 两阶段单纯形（稠密表），Bland 规则防循环
// 阶段一: 最小化人工变量之和，> FEASIBILITY_TOL 判定不可行
// 阶段二: 人工变量不再入基，按原目标优化
// ==========================================

use crate::engine::solver::{
    BlendSolver, ConstraintSense, LinearProgram, LpSolution, SolverError, SolverOutcome,
};

/// 主元/既约成本判零阈值
const EPS: f64 = 1e-9;

/// 阶段一残差容忍度
const FEASIBILITY_TOL: f64 = 1e-7;

/// 默认最大迭代次数
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

// ==========================================
// DenseSimplexSolver
// ==========================================
#[derive(Debug, Clone)]
pub struct DenseSimplexSolver {
    max_iterations: usize,
}

impl Default for DenseSimplexSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl DenseSimplexSolver {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }
}

/// 单纯形表
struct Tableau {
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    rhs_col: usize,
}

impl Tableau {
    fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.rhs_col]
    }

    fn is_basic(&self, col: usize) -> bool {
        self.basis.contains(&col)
    }

    /// 既约成本 r_j = c_j - c_Bᵀ B⁻¹ A_j
    fn reduced_cost(&self, cost: &[f64], col: usize) -> f64 {
        let basic_part: f64 = self
            .basis
            .iter()
            .enumerate()
            .map(|(i, &b)| cost[b] * self.rows[i][col])
            .sum();
        cost[col] - basic_part
    }

    fn pivot(&mut self, pivot_row: usize, pivot_col: usize) {
        let width = self.rows[pivot_row].len();
        let pivot_value = self.rows[pivot_row][pivot_col];
        for k in 0..width {
            self.rows[pivot_row][k] /= pivot_value;
        }

        for i in 0..self.rows.len() {
            if i == pivot_row {
                continue;
            }
            let factor = self.rows[i][pivot_col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..width {
                let v = self.rows[i][k] - factor * self.rows[pivot_row][k];
                self.rows[i][k] = if v.abs() < 1e-12 { 0.0 } else { v };
            }
        }
        self.basis[pivot_row] = pivot_col;
    }
}

impl DenseSimplexSolver {
    /// 在给定成本向量下迭代至最优
    ///
    /// - allowed_cols: 只有 [0, allowed_cols) 的列可以入基
    fn run_phase(
        &self,
        tableau: &mut Tableau,
        cost: &[f64],
        allowed_cols: usize,
        iterations: &mut usize,
    ) -> Result<(), SolverError> {
        loop {
            // Bland: 最小下标的负既约成本列入基
            let entering = (0..allowed_cols)
                .filter(|&j| !tableau.is_basic(j))
                .find(|&j| tableau.reduced_cost(cost, j) < -EPS);

            let col = match entering {
                Some(col) => col,
                None => return Ok(()),
            };

            if *iterations >= self.max_iterations {
                return Err(SolverError::IterationLimit(self.max_iterations));
            }

            // 最小比值检验，平局取基变量下标最小者
            let mut leaving: Option<(usize, f64)> = None;
            for i in 0..tableau.rows.len() {
                let a = tableau.rows[i][col];
                if a <= EPS {
                    continue;
                }
                let ratio = tableau.rhs(i) / a;
                leaving = match leaving {
                    None => Some((i, ratio)),
                    Some((li, lr)) => {
                        if ratio < lr - EPS
                            || (ratio <= lr + EPS && tableau.basis[i] < tableau.basis[li])
                        {
                            Some((i, ratio))
                        } else {
                            Some((li, lr))
                        }
                    }
                };
            }

            let (row, _) = leaving.ok_or(SolverError::Unbounded)?;
            tableau.pivot(row, col);
            *iterations += 1;
        }
    }
}

impl BlendSolver for DenseSimplexSolver {
    fn solve(&self, problem: &LinearProgram) -> Result<SolverOutcome, SolverError> {
        problem.validate()?;

        let n = problem.variable_count();
        let m = problem.constraints.len();

        // 右端项归一为非负
        let normalized: Vec<(Vec<f64>, ConstraintSense, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let flipped = match c.sense {
                        ConstraintSense::Equal => ConstraintSense::Equal,
                        ConstraintSense::LessOrEqual => ConstraintSense::GreaterOrEqual,
                        ConstraintSense::GreaterOrEqual => ConstraintSense::LessOrEqual,
                    };
                    (c.coefficients.iter().map(|v| -v).collect(), flipped, -c.rhs)
                } else {
                    (c.coefficients.clone(), c.sense, c.rhs)
                }
            })
            .collect();

        let n_slack = normalized
            .iter()
            .filter(|(_, sense, _)| *sense != ConstraintSense::Equal)
            .count();
        let n_artificial = normalized
            .iter()
            .filter(|(_, sense, _)| *sense != ConstraintSense::LessOrEqual)
            .count();
        let first_artificial = n + n_slack;
        let total = first_artificial + n_artificial;

        let mut tableau = Tableau {
            rows: vec![vec![0.0; total + 1]; m],
            basis: vec![0; m],
            rhs_col: total,
        };

        let mut slack_col = n;
        let mut artificial_col = first_artificial;
        for (i, (coefficients, sense, rhs)) in normalized.iter().enumerate() {
            tableau.rows[i][..n].copy_from_slice(coefficients);
            tableau.rows[i][total] = *rhs;
            match sense {
                ConstraintSense::LessOrEqual => {
                    tableau.rows[i][slack_col] = 1.0;
                    tableau.basis[i] = slack_col;
                    slack_col += 1;
                }
                ConstraintSense::GreaterOrEqual => {
                    tableau.rows[i][slack_col] = -1.0;
                    slack_col += 1;
                    tableau.rows[i][artificial_col] = 1.0;
                    tableau.basis[i] = artificial_col;
                    artificial_col += 1;
                }
                ConstraintSense::Equal => {
                    tableau.rows[i][artificial_col] = 1.0;
                    tableau.basis[i] = artificial_col;
                    artificial_col += 1;
                }
            }
        }

        let mut iterations = 0;

        // ===== 阶段一 =====
        if n_artificial > 0 {
            let phase_one_cost: Vec<f64> = (0..total)
                .map(|j| if j >= first_artificial { 1.0 } else { 0.0 })
                .collect();
            self.run_phase(&mut tableau, &phase_one_cost, total, &mut iterations)?;

            let residual: f64 = (0..m)
                .filter(|&i| tableau.basis[i] >= first_artificial)
                .map(|i| tableau.rhs(i))
                .sum();
            if residual > FEASIBILITY_TOL {
                tracing::debug!(residual, iterations, "单纯形阶段一残差大于容忍度，判定不可行");
                return Ok(SolverOutcome::Infeasible);
            }

            // 将零值人工变量换出基；整行为零的冗余约束保留
            for i in 0..m {
                if tableau.basis[i] >= first_artificial {
                    if let Some(j) = (0..first_artificial).find(|&j| tableau.rows[i][j].abs() > EPS) {
                        tableau.pivot(i, j);
                    }
                }
            }
        }

        // ===== 阶段二 =====
        let mut phase_two_cost = vec![0.0; total];
        phase_two_cost[..n].copy_from_slice(&problem.objective);
        self.run_phase(&mut tableau, &phase_two_cost, first_artificial, &mut iterations)?;

        let mut values = vec![0.0; n];
        for (i, &b) in tableau.basis.iter().enumerate() {
            if b < n {
                values[b] = tableau.rhs(i).max(0.0);
            }
        }
        let objective_value = values
            .iter()
            .zip(&problem.objective)
            .map(|(x, c)| x * c)
            .sum();

        Ok(SolverOutcome::Optimal(LpSolution {
            values,
            objective_value,
            iterations,
        }))
    }
}
