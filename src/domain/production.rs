// ==========================================
// 合金配料系统 - 生产记录领域模型
// ==========================================
// 红线: 每次成功投料执行恰好生成一条记录
// 红线: 创建后只允许修改质检字段
// 对齐: production_record 表
// ==========================================

use crate::domain::recipe::Recipe;
use crate::domain::types::QualityStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// MaterialUsage - 原料实际消耗
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialUsage {
    pub material_name: String,
    pub amount_kg: f64,
}

// ==========================================
// ProductionRecord - 生产记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub record_id: String,       // 记录ID（UUID）
    pub product_name: String,    // 产品名称
    pub amount_kg: f64,          // 实际产量（kg）
    pub produced_at: DateTime<Utc>,
    pub operator: String,        // 操作人
    pub quality_status: QualityStatus,
    pub quality_note: Option<String>,
    pub materials_used: Vec<MaterialUsage>,
}

impl ProductionRecord {
    /// 由配方和目标产量构造待写入的记录
    ///
    /// 消耗量 = 目标产量 × 占比 / 100，与库存扣减口径一致
    pub fn from_recipe(
        product_name: &str,
        target_amount_kg: f64,
        recipe: &Recipe,
        operator: &str,
    ) -> Self {
        let materials_used = recipe
            .lines
            .iter()
            .map(|line| MaterialUsage {
                material_name: line.material_name.clone(),
                amount_kg: required_amount(target_amount_kg, line.percentage),
            })
            .collect();

        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            product_name: product_name.to_string(),
            amount_kg: target_amount_kg,
            produced_at: Utc::now(),
            operator: operator.to_string(),
            quality_status: QualityStatus::Pending,
            quality_note: None,
            materials_used,
        }
    }

    /// 某原料的消耗量
    pub fn usage_of(&self, material_name: &str) -> Option<f64> {
        self.materials_used
            .iter()
            .find(|u| u.material_name == material_name)
            .map(|u| u.amount_kg)
    }
}

/// 单行原料需求量（kg）
pub fn required_amount(target_amount_kg: f64, percentage: f64) -> f64 {
    target_amount_kg * percentage / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::RecipeLine;

    #[test]
    fn test_from_recipe_derives_usage() {
        let recipe = Recipe::from_lines(vec![
            RecipeLine::new("A", 35.0),
            RecipeLine::new("B", 65.0),
        ]);

        let record = ProductionRecord::from_recipe("硅锰合金", 500.0, &recipe, "张三");

        assert_eq!(record.quality_status, QualityStatus::Pending);
        assert_eq!(record.amount_kg, 500.0);
        assert_eq!(record.usage_of("A"), Some(175.0));
        assert_eq!(record.usage_of("B"), Some(325.0));
        assert_eq!(record.usage_of("C"), None);
    }
}
