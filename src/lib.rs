// ==========================================
// 合金配料系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 最低成本配料计算 + 原子化投料执行
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 建模 / 求解 / 解释 / 投料执行
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体与类型
pub use domain::{
    Composition, ElementBound, ExecutionStatus, Material, MaterialUsage, ProductionRecord,
    QualityStatus, Recipe, RecipeLine, RequirementSet,
};

// 引擎
pub use engine::{
    BlendError, BlendOrchestrator, BlendSolver, ConstraintModelBuilder, DenseSimplexSolver,
    InventoryCommitCoordinator, RecipeInterpreter,
};

// 仓储
pub use repository::{InMemoryInventoryStore, InventoryStore, MaterialCatalog, SqliteInventoryStore};

// API
pub use api::{ApiError, BlendApi, MaterialApi, ProductionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "合金配料系统";
