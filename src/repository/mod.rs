// ==========================================
// 合金配料系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog;
pub mod error;
pub mod inventory_memory;
pub mod inventory_sqlite;
pub mod material_repo;
pub mod production_repo;

// 重导出核心仓储
pub use catalog::{InventoryStore, MaterialCatalog, StockUnitOfWork};
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_memory::InMemoryInventoryStore;
pub use inventory_sqlite::SqliteInventoryStore;
pub use material_repo::MaterialRepository;
pub use production_repo::ProductionRecordRepository;
