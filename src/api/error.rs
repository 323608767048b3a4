// ==========================================
// 合金配料系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换 Repository / Engine / Importer 错误
// 红线: 错误信息必须包含显式原因（原料、需求量、可用量等）
// ==========================================

use crate::engine::error::BlendError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 配方计算错误
    // ==========================================
    #[error("成分要求无效: {0}")]
    InvalidRequirement(String),

    #[error("无可行配方: {0}")]
    NoFeasibleRecipe(String),

    #[error("求解器失败: {0}")]
    SolverFailure(String),

    // ==========================================
    // 投料执行错误
    // ==========================================
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

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 稳定的错误码（命令行 JSON 输出使用）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequirement(_) => "INVALID_REQUIREMENT",
            ApiError::NoFeasibleRecipe(_) => "NO_FEASIBLE_RECIPE",
            ApiError::SolverFailure(_) => "SOLVER_FAILURE",
            ApiError::InvalidExecutionRequest(_) => "INVALID_EXECUTION_REQUEST",
            ApiError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ApiError::TransactionAbort(_) => "TRANSACTION_ABORT",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "DATABASE_ERROR",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("检查约束违反: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
        }
    }
}

// ==========================================
// 从 BlendError 转换（一一对应，保留结构化字段）
// ==========================================
impl From<BlendError> for ApiError {
    fn from(err: BlendError) -> Self {
        match err {
            BlendError::InvalidRequirement(msg) => ApiError::InvalidRequirement(msg),
            BlendError::NoFeasibleRecipe(msg) => ApiError::NoFeasibleRecipe(msg),
            BlendError::SolverFailure(msg) => ApiError::SolverFailure(msg),
            BlendError::InvalidExecutionRequest(msg) => ApiError::InvalidExecutionRequest(msg),
            BlendError::MaterialNotFound { material_name } => {
                ApiError::MaterialNotFound { material_name }
            }
            BlendError::InsufficientStock {
                material_name,
                required_kg,
                available_kg,
            } => ApiError::InsufficientStock {
                material_name,
                required_kg,
                available_kg,
            },
            BlendError::TransactionAbort(msg) => ApiError::TransactionAbort(msg),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::RepositoryError(repo_err) => repo_err.into(),
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {}", path)),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ProductionRecord".to_string(),
            id: "R001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ProductionRecord"));
                assert!(msg.contains("R001"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::LockError("busy".to_string()).into();
        assert_eq!(api_err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_blend_error_conversion_keeps_quantities() {
        let api_err: ApiError = BlendError::InsufficientStock {
            material_name: "B".to_string(),
            required_kg: 325.0,
            available_kg: 100.0,
        }
        .into();

        assert_eq!(api_err.code(), "INSUFFICIENT_STOCK");
        match api_err {
            ApiError::InsufficientStock {
                material_name,
                required_kg,
                available_kg,
            } => {
                assert_eq!(material_name, "B");
                assert_eq!(required_kg, 325.0);
                assert_eq!(available_kg, 100.0);
            }
            _ => panic!("Expected InsufficientStock"),
        }
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::MissingColumn("name".to_string()).into();
        assert!(matches!(api_err, ApiError::ImportError(msg) if msg.contains("name")));

        let api_err: ApiError =
            ImportError::RepositoryError(RepositoryError::FieldValueError {
                field: "stock_kg".to_string(),
                message: "库存不能为负".to_string(),
            })
            .into();
        assert!(matches!(api_err, ApiError::InvalidInput(msg) if msg.contains("stock_kg")));
    }
}
