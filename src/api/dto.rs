// ==========================================
// 合金配料系统 - API 数据传输对象
// ==========================================
// 对外格式:
//   计算配方: {requirements: {元素: {min?, max?}}} → {recipe: [{name, percentage}], total_cost}
//   投料执行: {product_name, target_amount, recipe, operator?} → {status: "executed", record_id}
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::material::{Composition, Material};
use crate::domain::production::MaterialUsage;
use crate::domain::recipe::{Recipe, RecipeLine};
use crate::domain::requirement::RequirementSet;
use crate::domain::types::ExecutionStatus;
use crate::engine::commit::ExecutionRequest;
use serde::{Deserialize, Serialize};

// ==========================================
// 计算配方
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeRecipeRequest {
    pub requirements: RequirementSet,
}

impl ComputeRecipeRequest {
    /// 从成分要求 JSON（{元素: {min?, max?}}）构建请求
    ///
    /// # 错误
    /// - InvalidRequirement: JSON 结构或取值类型不合法
    pub fn from_requirements_json(text: &str) -> ApiResult<Self> {
        let requirements: RequirementSet = serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidRequirement(format!("成分要求格式错误: {}", e)))?;
        Ok(Self { requirements })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeRecipeResponse {
    pub recipe: Vec<RecipeLine>,
    pub total_cost: f64,
}

impl From<Recipe> for ComputeRecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            recipe: recipe.lines,
            total_cost: recipe.total_cost,
        }
    }
}

// ==========================================
// 投料执行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteProductionRequest {
    pub product_name: String,
    #[serde(alias = "target_amount_kg")]
    pub target_amount: f64,
    pub recipe: Vec<RecipeLine>,
    #[serde(default)]
    pub operator: Option<String>,
}

impl ExecuteProductionRequest {
    /// 解析配方 JSON（[{name, percentage}]）
    ///
    /// # 错误
    /// - InvalidExecutionRequest: 字段缺失或类型不合法
    pub fn parse_recipe_json(text: &str) -> ApiResult<Vec<RecipeLine>> {
        serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidExecutionRequest(format!("配方格式错误: {}", e)))
    }

    pub fn into_execution_request(self) -> ExecutionRequest {
        ExecutionRequest {
            product_name: self.product_name,
            target_amount_kg: self.target_amount,
            recipe: Recipe::from_lines(self.recipe),
            operator: self.operator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteProductionResponse {
    pub status: ExecutionStatus,
    pub record_id: String,
    pub materials_used: Vec<MaterialUsage>,
}

// ==========================================
// 查询视图
// ==========================================

/// 原料列表视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialView {
    pub material_id: String,
    pub name: String,
    pub location: Option<String>,
    pub composition: Composition,
    pub stock_kg: f64,
    pub unit_price: f64,
    pub eligible: bool,
}

impl From<Material> for MaterialView {
    fn from(material: Material) -> Self {
        Self {
            eligible: material.is_eligible(),
            material_id: material.material_id,
            name: material.name,
            location: material.location,
            composition: material.composition,
            stock_kg: material.stock_kg,
            unit_price: material.unit_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::requirement::ElementBound;

    #[test]
    fn test_requirements_json_parsed() {
        let request =
            ComputeRecipeRequest::from_requirements_json(r#"{"Si":{"min":30,"max":40}}"#).unwrap();
        assert_eq!(
            request.requirements,
            RequirementSet::new().with("Si", ElementBound::between(30.0, 40.0))
        );
    }

    #[test]
    fn test_malformed_requirements_json_is_invalid_requirement() {
        for text in [r#"{"Si":{"min":"x"}}"#, "[1,2]", "{"] {
            let result = ComputeRecipeRequest::from_requirements_json(text);
            assert!(
                matches!(result, Err(ApiError::InvalidRequirement(_))),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_malformed_recipe_json_is_invalid_execution_request() {
        let lines =
            ExecuteProductionRequest::parse_recipe_json(r#"[{"name":"A","percentage":100}]"#)
                .unwrap();
        assert_eq!(lines, vec![RecipeLine::new("A", 100.0)]);

        for text in [r#"[{"name":"A"}]"#, r#"[{"name":"A","percentage":"x"}]"#, "not json"] {
            let result = ExecuteProductionRequest::parse_recipe_json(text);
            assert!(
                matches!(result, Err(ApiError::InvalidExecutionRequest(_))),
                "{} should be rejected",
                text
            );
        }
    }
}
