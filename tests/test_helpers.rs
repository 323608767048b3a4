// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use alloy_blend::db::{init_schema, open_sqlite_connection};
use alloy_blend::domain::{Composition, Material};
use alloy_blend::repository::MaterialRepository;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 构造原料
pub fn material(name: &str, elements: &[(&str, f64)], stock_kg: f64, unit_price: f64) -> Material {
    let composition: Composition = elements
        .iter()
        .map(|(element, pct)| (element.to_string(), *pct))
        .collect();
    Material::new(name, composition, stock_kg, unit_price)
}

/// 写入原料
pub fn seed_materials(db_path: &str, materials: &[Material]) -> Result<(), Box<dyn Error>> {
    let repo = MaterialRepository::new(db_path)?;
    repo.batch_upsert(materials)?;
    Ok(())
}

/// 两原料硅目录: A{Si:100, 价 10}, B{Si:0, 价 2}
pub fn si_catalog(stock_a: f64, stock_b: f64) -> Vec<Material> {
    vec![
        material("A", &[("Si", 100.0)], stock_a, 10.0),
        material("B", &[], stock_b, 2.0),
    ]
}

/// 多元素目录（钢铁配料）
pub fn steel_catalog() -> Vec<Material> {
    vec![
        material("废钢", &[("Fe", 98.5), ("C", 0.2), ("Mn", 0.6), ("Si", 0.3)], 5000.0, 2.1),
        material("生铁", &[("Fe", 94.0), ("C", 4.2), ("Mn", 0.5), ("Si", 0.8)], 3000.0, 2.8),
        material("硅铁", &[("Fe", 24.0), ("Si", 75.0), ("C", 0.1)], 400.0, 7.5),
        material("锰铁", &[("Fe", 18.0), ("Mn", 75.0), ("C", 6.5)], 400.0, 8.2),
        material("低碳锰铁", &[("Fe", 19.0), ("Mn", 80.0), ("C", 0.5)], 200.0, 12.0),
        material("纯铁", &[("Fe", 99.8), ("C", 0.01)], 0.0, 1.0),
    ]
}
