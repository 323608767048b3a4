// ==========================================
// 合金配料系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 质检状态 (Quality Status)
// ==========================================
// 生产记录创建时固定为 PENDING，之后仅质检字段可变
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    #[default]
    Pending, // 待检
    Passed,  // 合格
    Failed,  // 不合格
}

impl QualityStatus {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(QualityStatus::Pending),
            "PASSED" => Some(QualityStatus::Passed),
            "FAILED" => Some(QualityStatus::Failed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            QualityStatus::Pending => "PENDING",
            QualityStatus::Passed => "PASSED",
            QualityStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 执行状态 (Execution Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Executed, // 已投料
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Executed => write!(f, "executed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_status_db_roundtrip() {
        for status in [QualityStatus::Pending, QualityStatus::Passed, QualityStatus::Failed] {
            assert_eq!(QualityStatus::from_str(status.to_db_str()), Some(status));
        }
        assert_eq!(QualityStatus::from_str("passed"), Some(QualityStatus::Passed));
        assert_eq!(QualityStatus::from_str("UNKNOWN"), None);
    }

    #[test]
    fn test_quality_status_default_is_pending() {
        assert_eq!(QualityStatus::default(), QualityStatus::Pending);
    }
}
