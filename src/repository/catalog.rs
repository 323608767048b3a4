// ==========================================
// 合金配料系统 - 原料目录与库存事务接口
// ==========================================
// 职责: 定义优化链路（只读）与投料执行（加锁写）所依赖的存储契约
// 红线: 加锁读 → 扣减 → 写生产记录 必须处于同一事务单元
// ==========================================

use crate::domain::material::Material;
use crate::domain::production::ProductionRecord;
use crate::repository::error::RepositoryResult;

// ==========================================
// MaterialCatalog - 原料目录（只读快照）
// ==========================================
pub trait MaterialCatalog: Send + Sync {
    /// 列出可参与配料的原料（库存 > 0）
    fn list_eligible_materials(&self) -> RepositoryResult<Vec<Material>>;
}

// ==========================================
// StockUnitOfWork - 库存事务单元
// ==========================================
/// 一次投料执行的事务单元
///
/// 生命周期: `InventoryStore::begin` 创建，`commit` / `rollback` 结束。
/// 未显式结束即被 drop 时等同于 rollback。
pub trait StockUnitOfWork {
    /// 对原料库存行加排他锁并读取当前库存
    ///
    /// # 返回
    /// - Ok(Some(stock)): 加锁成功
    /// - Ok(None): 原料不存在
    fn lock_and_read_stock(&mut self, material_name: &str) -> RepositoryResult<Option<f64>>;

    /// 扣减库存（调用前必须已通过 lock_and_read_stock 加锁）
    fn deduct_stock(&mut self, material_name: &str, amount_kg: f64) -> RepositoryResult<()>;

    /// 追加生产记录
    fn insert_production_record(&mut self, record: &ProductionRecord) -> RepositoryResult<()>;

    /// 提交全部写入并释放锁
    fn commit(self: Box<Self>) -> RepositoryResult<()>;

    /// 丢弃全部写入并释放锁
    fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}

// ==========================================
// InventoryStore - 库存存储
// ==========================================
pub trait InventoryStore: Send + Sync {
    /// 开启一个事务单元
    fn begin(&self) -> RepositoryResult<Box<dyn StockUnitOfWork + '_>>;
}
