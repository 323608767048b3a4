// ==========================================
// 合金配料系统 - 原料数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 库存扣减不在此处，走 InventoryStore 事务
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::{Composition, Material};
use crate::repository::catalog::MaterialCatalog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const MATERIAL_COLUMNS: &str =
    "material_id, name, location, composition_json, stock_kg, unit_price, updated_at";

// ==========================================
// MaterialRepository - 原料仓储
// ==========================================
/// 原料仓储
/// 职责: 管理 material 表的读写
pub struct MaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRepository {
    /// 创建新的 MaterialRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量写入原料（按名称 upsert）
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    ///
    /// # 说明
    /// - 名称已存在时更新库位/成分/库存/单价，保留原 material_id
    /// - 使用事务确保原子性
    pub fn batch_upsert(&self, materials: &[Material]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for material in materials {
            validate_material(material)?;
            tx.execute(
                r#"
                INSERT INTO material (
                    material_id, name, location, composition_json,
                    stock_kg, unit_price, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(name) DO UPDATE SET
                    location = excluded.location,
                    composition_json = excluded.composition_json,
                    stock_kg = excluded.stock_kg,
                    unit_price = excluded.unit_price,
                    updated_at = excluded.updated_at
                "#,
                params![
                    material.material_id,
                    material.name,
                    material.location,
                    serde_json::to_string(&material.composition)?,
                    material.stock_kg,
                    material.unit_price,
                    material.updated_at.to_rfc3339(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 写入单个原料
    pub fn upsert(&self, material: &Material) -> RepositoryResult<()> {
        self.batch_upsert(std::slice::from_ref(material))?;
        Ok(())
    }

    /// 按名称查询
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM material WHERE name = ?1", MATERIAL_COLUMNS);
        let material = conn
            .query_row(&sql, params![name], map_material_row)
            .optional()?;
        Ok(material)
    }

    /// 按 material_id 查询
    pub fn find_by_id(&self, material_id: &str) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM material WHERE material_id = ?1", MATERIAL_COLUMNS);
        let material = conn
            .query_row(&sql, params![material_id], map_material_row)
            .optional()?;
        Ok(material)
    }

    /// 查询全部原料（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Material>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM material ORDER BY name", MATERIAL_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_material_row)?;
        let materials = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(materials)
    }

    /// 查询可参与配料的原料（库存 > 0，按名称排序）
    pub fn list_eligible(&self) -> RepositoryResult<Vec<Material>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM material WHERE stock_kg > 0 ORDER BY name",
            MATERIAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_material_row)?;
        let materials = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(materials)
    }

    /// 入库（补充库存）
    ///
    /// # 返回
    /// - Ok(f64): 入库后的库存
    pub fn add_stock(&self, name: &str, amount_kg: f64) -> RepositoryResult<f64> {
        if !amount_kg.is_finite() || amount_kg <= 0.0 {
            return Err(RepositoryError::FieldValueError {
                field: "amount_kg".to_string(),
                message: format!("入库量必须为正数: {}", amount_kg),
            });
        }

        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE material SET stock_kg = stock_kg + ?1, updated_at = ?2 WHERE name = ?3",
            params![amount_kg, Utc::now().to_rfc3339(), name],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Material".to_string(),
                id: name.to_string(),
            });
        }

        let stock: f64 = conn.query_row(
            "SELECT stock_kg FROM material WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(stock)
    }
}

impl MaterialCatalog for MaterialRepository {
    fn list_eligible_materials(&self) -> RepositoryResult<Vec<Material>> {
        self.list_eligible()
    }
}

/// 原料写入前的字段校验
fn validate_material(material: &Material) -> RepositoryResult<()> {
    if material.name.trim().is_empty() {
        return Err(RepositoryError::FieldValueError {
            field: "name".to_string(),
            message: "原料名称不能为空".to_string(),
        });
    }
    if !material.stock_kg.is_finite() || material.stock_kg < 0.0 {
        return Err(RepositoryError::FieldValueError {
            field: "stock_kg".to_string(),
            message: format!("库存不能为负: {}", material.stock_kg),
        });
    }
    if !material.unit_price.is_finite() || material.unit_price < 0.0 {
        return Err(RepositoryError::FieldValueError {
            field: "unit_price".to_string(),
            message: format!("单价不能为负: {}", material.unit_price),
        });
    }
    for (element, pct) in &material.composition {
        if !pct.is_finite() || !(0.0..=100.0).contains(pct) {
            return Err(RepositoryError::FieldValueError {
                field: format!("composition.{}", element),
                message: format!("成分百分比超出 [0, 100]: {}", pct),
            });
        }
    }
    Ok(())
}

fn map_material_row(row: &Row<'_>) -> rusqlite::Result<Material> {
    let composition_json: String = row.get(3)?;
    let composition: Composition = serde_json::from_str(&composition_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Material {
        material_id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        composition,
        stock_kg: row.get(4)?,
        unit_price: row.get(5)?,
        updated_at: row
            .get::<_, String>(6)?
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}
