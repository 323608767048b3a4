// ==========================================
// 合金配料系统 - 配方领域模型
// ==========================================
// 用途: 优化结果（按原料的百分比 + 每 kg 成本）
// 生命周期: 每次优化调用生成，执行前不落库
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RecipeLine - 配方明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    #[serde(rename = "name", alias = "material_name")]
    pub material_name: String, // 原料名称
    pub percentage: f64,       // 占比（%），> 0
}

impl RecipeLine {
    pub fn new(material_name: &str, percentage: f64) -> Self {
        Self {
            material_name: material_name.to_string(),
            percentage,
        }
    }
}

// ==========================================
// Recipe - 配方
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub lines: Vec<RecipeLine>,
    pub total_cost: f64, // 每 kg 混合料成本
}

impl Recipe {
    pub fn new(lines: Vec<RecipeLine>, total_cost: f64) -> Self {
        Self { lines, total_cost }
    }

    /// 仅由明细构成的配方（执行请求使用，成本不参与执行）
    pub fn from_lines(lines: Vec<RecipeLine>) -> Self {
        Self {
            lines,
            total_cost: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 百分比合计
    pub fn total_percentage(&self) -> f64 {
        self.lines.iter().map(|l| l.percentage).sum()
    }

    /// 查找某原料的占比
    pub fn percentage_of(&self, material_name: &str) -> Option<f64> {
        self.lines
            .iter()
            .find(|l| l.material_name == material_name)
            .map(|l| l.percentage)
    }
}
