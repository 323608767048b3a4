// ==========================================
// 合金配料系统 - SQLite 库存事务存储
// ==========================================
// 事务: BEGIN IMMEDIATE 获取写锁，覆盖本事务涉及的所有原料行
// 等待: 受 busy_timeout 约束（见 db::DEFAULT_BUSY_TIMEOUT_MS）
// 红线: 未提交即释放时必须 ROLLBACK
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::production::ProductionRecord;
use crate::repository::catalog::{InventoryStore, StockUnitOfWork};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::production_repo::insert_record_in;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteInventoryStore
// ==========================================
pub struct SqliteInventoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteInventoryStore {
    /// 使用独立连接（多进程/多实例并发时由 SQLite 写锁串行化）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 与其他仓储共享连接（连接互斥锁本身即串行化事务）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl InventoryStore for SqliteInventoryStore {
    fn begin(&self) -> RepositoryResult<Box<dyn StockUnitOfWork + '_>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute_batch("BEGIN IMMEDIATE")?;

        Ok(Box::new(SqliteUnitOfWork {
            conn,
            locked: HashSet::new(),
            finished: false,
        }))
    }
}

// ==========================================
// SqliteUnitOfWork
// ==========================================
struct SqliteUnitOfWork<'a> {
    conn: MutexGuard<'a, Connection>,
    locked: HashSet<String>,
    finished: bool,
}

impl StockUnitOfWork for SqliteUnitOfWork<'_> {
    fn lock_and_read_stock(&mut self, material_name: &str) -> RepositoryResult<Option<f64>> {
        let stock: Option<f64> = self
            .conn
            .query_row(
                "SELECT stock_kg FROM material WHERE name = ?1",
                params![material_name],
                |row| row.get(0),
            )
            .optional()?;

        if stock.is_some() {
            self.locked.insert(material_name.to_string());
        }
        Ok(stock)
    }

    fn deduct_stock(&mut self, material_name: &str, amount_kg: f64) -> RepositoryResult<()> {
        if !self.locked.contains(material_name) {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "扣减前未加锁: {}",
                material_name
            )));
        }

        // stock_kg 上有 CHECK (stock_kg >= 0)，超扣会直接报约束错误
        let affected = self.conn.execute(
            "UPDATE material SET stock_kg = stock_kg - ?1, updated_at = ?2 WHERE name = ?3",
            params![amount_kg, Utc::now().to_rfc3339(), material_name],
        )?;
        if affected != 1 {
            return Err(RepositoryError::NotFound {
                entity: "Material".to_string(),
                id: material_name.to_string(),
            });
        }
        Ok(())
    }

    fn insert_production_record(&mut self, record: &ProductionRecord) -> RepositoryResult<()> {
        insert_record_in(&self.conn, record)
    }

    fn commit(mut self: Box<Self>) -> RepositoryResult<()> {
        match self.conn.execute_batch("COMMIT") {
            Ok(()) => {
                self.finished = true;
                Ok(())
            }
            // 提交失败时交给 Drop 回滚
            Err(e) => Err(RepositoryError::DatabaseTransactionError(e.to_string())),
        }
    }

    fn rollback(mut self: Box<Self>) -> RepositoryResult<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteUnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "库存事务回滚失败");
            }
        }
    }
}
