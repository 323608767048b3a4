// ==========================================
// 合金配料系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod material;
pub mod production;
pub mod recipe;
pub mod requirement;
pub mod types;

// 重导出核心类型
pub use material::{Composition, Material};
pub use production::{required_amount, MaterialUsage, ProductionRecord};
pub use recipe::{Recipe, RecipeLine};
pub use requirement::{ElementBound, RequirementSet};
pub use types::{ExecutionStatus, QualityStatus};
