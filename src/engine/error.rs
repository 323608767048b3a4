// ==========================================
// 合金配料系统 - 引擎层错误类型
// ==========================================
// 红线: 所有失败以具名错误返回调用方，引擎内部不重试
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 配料引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlendError {
    // ===== 优化链路 =====
    #[error("成分要求无效: {0}")]
    InvalidRequirement(String),

    #[error("无可行配方: {0}")]
    NoFeasibleRecipe(String),

    #[error("求解器失败: {0}")]
    SolverFailure(String),

    // ===== 投料执行 =====
    #[error("投料请求无效: {0}")]
    InvalidExecutionRequest(String),

    #[error("原料不存在: {material_name}")]
    MaterialNotFound { material_name: String },

    #[error("库存不足: material={material_name}, required={required_kg:.3}kg, available={available_kg:.3}kg")]
    InsufficientStock {
        material_name: String,
        required_kg: f64,
        available_kg: f64,
    },

    #[error("投料事务已回滚: {0}")]
    TransactionAbort(String),
}

/// Result 类型别名
pub type BlendResult<T> = Result<T, BlendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_names_quantities() {
        let err = BlendError::InsufficientStock {
            material_name: "硅铁".to_string(),
            required_kg: 175.0,
            available_kg: 100.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("硅铁"));
        assert!(msg.contains("175.000"));
        assert!(msg.contains("100.000"));
    }
}
