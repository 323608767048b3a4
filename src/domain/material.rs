// ==========================================
// 合金配料系统 - 原料领域模型
// ==========================================
// 职责: 原料主数据（成分/单价/库存）
// 红线: 库存只允许由投料执行事务扣减，不得为负
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 成分表: 元素符号 → 质量百分比（0~100）
///
/// 使用 BTreeMap 保证序列化顺序稳定（JSON 快照可比对）
pub type Composition = BTreeMap<String, f64>;

// ==========================================
// Material - 原料
// ==========================================
// 对齐: material 表
// 说明: 成分合计不要求等于 100（存在"其他"杂项）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    // ===== 主键 =====
    pub material_id: String, // 原料唯一标识

    // ===== 基础信息 =====
    pub name: String,             // 原料名称（唯一，配方按名称引用）
    pub location: Option<String>, // 存放库位

    // ===== 配料维度 =====
    pub composition: Composition, // 元素成分（wt%）
    pub stock_kg: f64,            // 可用库存（kg）
    pub unit_price: f64,          // 单价（每 kg）

    // ===== 审计字段 =====
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// 创建原料（自动生成 material_id）
    pub fn new(name: &str, composition: Composition, stock_kg: f64, unit_price: f64) -> Self {
        Self {
            material_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            location: None,
            composition,
            stock_kg,
            unit_price,
            updated_at: Utc::now(),
        }
    }

    /// 指定元素的成分百分比，未登记视为 0
    pub fn element_pct(&self, element: &str) -> f64 {
        self.composition.get(element).copied().unwrap_or(0.0)
    }

    /// 是否可参与配料（库存 > 0）
    pub fn is_eligible(&self) -> bool {
        self.stock_kg > 0.0
    }
}
