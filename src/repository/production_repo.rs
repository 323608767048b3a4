// ==========================================
// 合金配料系统 - 生产记录数据仓储
// ==========================================
// 红线: 生产记录只由投料事务写入（insert_record_in），此处仅查询与质检更新
// 对齐: production_record 表
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::production::{MaterialUsage, ProductionRecord};
use crate::domain::types::QualityStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const RECORD_COLUMNS: &str = "record_id, product_name, amount_kg, produced_at, operator, \
     quality_status, quality_note, materials_used_json";

// ==========================================
// ProductionRecordRepository - 生产记录仓储
// ==========================================
pub struct ProductionRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRecordRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按记录ID查询
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<ProductionRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM production_record WHERE record_id = ?1", RECORD_COLUMNS);
        let record = conn
            .query_row(&sql, params![record_id], map_record_row)
            .optional()?;
        Ok(record)
    }

    /// 最近的生产记录（按生产时间倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_record ORDER BY produced_at DESC, record_id LIMIT ?1",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], map_record_row)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 按产品查询生产记录（按生产时间倒序）
    pub fn list_by_product(
        &self,
        product_name: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_record WHERE product_name = ?1 \
             ORDER BY produced_at DESC, record_id LIMIT ?2",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![product_name, limit as i64], map_record_row)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 统计生产记录数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM production_record", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// 更新质检结果（生产记录唯一可变的字段组）
    pub fn update_quality(
        &self,
        record_id: &str,
        status: QualityStatus,
        note: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE production_record SET quality_status = ?1, quality_note = ?2 WHERE record_id = ?3",
            params![status.to_db_str(), note, record_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionRecord".to_string(),
                id: record_id.to_string(),
            });
        }
        Ok(())
    }
}

/// 在调用方已开启的事务中写入生产记录
pub(crate) fn insert_record_in(conn: &Connection, record: &ProductionRecord) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO production_record (
            record_id, product_name, amount_kg, produced_at, operator,
            quality_status, quality_note, materials_used_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            record.record_id,
            record.product_name,
            record.amount_kg,
            record.produced_at.to_rfc3339(),
            record.operator,
            record.quality_status.to_db_str(),
            record.quality_note,
            serde_json::to_string(&record.materials_used)?,
        ],
    )?;
    Ok(())
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<ProductionRecord> {
    let status_raw: String = row.get(5)?;
    let usage_json: String = row.get(7)?;
    let materials_used: Vec<MaterialUsage> = serde_json::from_str(&usage_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ProductionRecord {
        record_id: row.get(0)?,
        product_name: row.get(1)?,
        amount_kg: row.get(2)?,
        produced_at: row
            .get::<_, String>(3)?
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap_or_else(|_| chrono::Utc::now()),
        operator: row.get(4)?,
        quality_status: QualityStatus::from_str(&status_raw).unwrap_or_default(),
        quality_note: row.get(6)?,
        materials_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::recipe::{Recipe, RecipeLine};

    fn setup() -> (Arc<Mutex<Connection>>, ProductionRecordRepository) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), ProductionRecordRepository::from_connection(conn))
    }

    fn record(product: &str) -> ProductionRecord {
        let recipe = Recipe::from_lines(vec![RecipeLine::new("A", 40.0), RecipeLine::new("B", 60.0)]);
        ProductionRecord::from_recipe(product, 200.0, &recipe, "tester")
    }

    #[test]
    fn test_insert_and_find_by_id() {
        let (conn, repo) = setup();
        let rec = record("P1");
        insert_record_in(&conn.lock().unwrap(), &rec).unwrap();

        let found = repo.find_by_id(&rec.record_id).unwrap().unwrap();
        assert_eq!(found.product_name, "P1");
        assert_eq!(found.quality_status, QualityStatus::Pending);
        assert_eq!(found.usage_of("A"), Some(80.0));
        assert_eq!(found.usage_of("B"), Some(120.0));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_list_by_product() {
        let (conn, repo) = setup();
        {
            let guard = conn.lock().unwrap();
            insert_record_in(&guard, &record("P1")).unwrap();
            insert_record_in(&guard, &record("P1")).unwrap();
            insert_record_in(&guard, &record("P2")).unwrap();
        }

        assert_eq!(repo.list_by_product("P1", 10).unwrap().len(), 2);
        assert_eq!(repo.list_by_product("P2", 10).unwrap().len(), 1);
        assert_eq!(repo.list_recent(2).unwrap().len(), 2);
    }

    #[test]
    fn test_update_quality() {
        let (conn, repo) = setup();
        let rec = record("P1");
        insert_record_in(&conn.lock().unwrap(), &rec).unwrap();

        repo.update_quality(&rec.record_id, QualityStatus::Passed, Some("光谱合格"))
            .unwrap();
        let found = repo.find_by_id(&rec.record_id).unwrap().unwrap();
        assert_eq!(found.quality_status, QualityStatus::Passed);
        assert_eq!(found.quality_note.as_deref(), Some("光谱合格"));

        assert!(matches!(
            repo.update_quality("missing", QualityStatus::Failed, None),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
