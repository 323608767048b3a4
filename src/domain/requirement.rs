// ==========================================
// 合金配料系统 - 成分要求领域模型
// ==========================================
// 用途: 目标产品各元素的百分比上下限
// 说明: 缺省的一侧视为不约束
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ElementBound - 单元素上下限（百分比）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementBound {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ElementBound {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// 上下限都给定
    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    /// 两侧都未给定（不产生约束）
    pub fn is_unconstrained(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

// ==========================================
// RequirementSet - 成分要求集合
// ==========================================
// JSON 形态: {"Si": {"min": 30, "max": 40}, "C": {"max": 0.2}}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementSet {
    elements: BTreeMap<String, ElementBound>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个元素要求（链式）
    pub fn with(mut self, element: &str, bound: ElementBound) -> Self {
        self.insert(element, bound);
        self
    }

    pub fn insert(&mut self, element: &str, bound: ElementBound) {
        self.elements.insert(element.to_string(), bound);
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn get(&self, element: &str) -> Option<&ElementBound> {
        self.elements.get(element)
    }

    /// 按元素符号顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ElementBound)> {
        self.elements.iter()
    }
}

impl FromIterator<(String, ElementBound)> for RequirementSet {
    fn from_iter<T: IntoIterator<Item = (String, ElementBound)>>(iter: T) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}
