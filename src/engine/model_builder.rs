// ==========================================
// 合金配料系统 - 约束模型构建器
// ==========================================
// 输入: 成分要求 + 原料目录快照
// 输出: BlendProblem（只建模，不求解）
// ==========================================
// 变量: 每个可用原料（库存 > 0）一个配比分数 x_i ≥ 0
// 目标: min Σ unit_price_i · x_i
// 约束: Σ x_i = 1；每个受约束元素 min/100 ≤ Σ (pct_i/100) · x_i ≤ max/100
// ==========================================

use crate::domain::material::Material;
use crate::domain::requirement::{ElementBound, RequirementSet};
use crate::engine::error::{BlendError, BlendResult};
use crate::engine::solver::{ConstraintSense, LinearConstraint, LinearProgram};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// 配比变量与原料的对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendVariable {
    pub material_id: String,
    pub material_name: String,
    pub unit_price: f64,
}

// ==========================================
// BlendProblem - 配料线性规划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendProblem {
    pub variables: Vec<BlendVariable>,
    pub program: LinearProgram,
}

impl BlendProblem {
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

// ==========================================
// ConstraintModelBuilder
// ==========================================
#[derive(Debug, Default, Clone)]
pub struct ConstraintModelBuilder;

impl ConstraintModelBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建配料问题
    ///
    /// # 错误
    /// - InvalidRequirement: 要求为空、元素名为空/重复、上下限非法或 max < min
    pub fn build(
        &self,
        requirements: &RequirementSet,
        catalog: &[Material],
    ) -> BlendResult<BlendProblem> {
        let bounds = normalize_requirements(requirements)?;

        let eligible: Vec<&Material> = catalog.iter().filter(|m| m.is_eligible()).collect();
        let variables: Vec<BlendVariable> = eligible
            .iter()
            .map(|m| BlendVariable {
                material_id: m.material_id.clone(),
                material_name: m.name.clone(),
                unit_price: m.unit_price,
            })
            .collect();

        let objective: Vec<f64> = eligible.iter().map(|m| m.unit_price).collect();

        let mut constraints = vec![LinearConstraint {
            label: "sum_to_one".to_string(),
            coefficients: vec![1.0; eligible.len()],
            sense: ConstraintSense::Equal,
            rhs: 1.0,
        }];

        for (element, bound) in &bounds {
            let coefficients: Vec<f64> = eligible
                .iter()
                .map(|m| m.element_pct(element) / 100.0)
                .collect();

            if let Some(min) = bound.min {
                constraints.push(LinearConstraint {
                    label: format!("{}>=min", element),
                    coefficients: coefficients.clone(),
                    sense: ConstraintSense::GreaterOrEqual,
                    rhs: min / 100.0,
                });
            }
            if let Some(max) = bound.max {
                constraints.push(LinearConstraint {
                    label: format!("{}<=max", element),
                    coefficients,
                    sense: ConstraintSense::LessOrEqual,
                    rhs: max / 100.0,
                });
            }
        }

        debug!(
            eligible = eligible.len(),
            skipped = catalog.len() - eligible.len(),
            constraints = constraints.len(),
            "配料模型构建完成"
        );

        Ok(BlendProblem {
            variables,
            program: LinearProgram {
                objective,
                constraints,
            },
        })
    }
}

/// 校验并规整成分要求（元素名去空白，按元素排序）
fn normalize_requirements(
    requirements: &RequirementSet,
) -> BlendResult<BTreeMap<String, ElementBound>> {
    if requirements.is_empty() {
        return Err(BlendError::InvalidRequirement("成分要求不能为空".to_string()));
    }

    let mut bounds = BTreeMap::new();
    for (raw_element, bound) in requirements.iter() {
        let element = raw_element.trim();
        if element.is_empty() {
            return Err(BlendError::InvalidRequirement("元素符号不能为空".to_string()));
        }

        for (side, value) in [("min", bound.min), ("max", bound.max)] {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                    return Err(BlendError::InvalidRequirement(format!(
                        "{} 的 {} 超出 [0, 100]: {}",
                        element, side, v
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (bound.min, bound.max) {
            if max < min {
                return Err(BlendError::InvalidRequirement(format!(
                    "{} 的上限 {} 小于下限 {}",
                    element, max, min
                )));
            }
        }

        if bounds.insert(element.to_string(), *bound).is_some() {
            return Err(BlendError::InvalidRequirement(format!("元素重复: {}", element)));
        }
    }
    Ok(bounds)
}
