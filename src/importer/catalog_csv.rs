// ==========================================
// 合金配料系统 - 原料目录 CSV 导入
// ==========================================
// 列: name, location, stock_kg, unit_price, [material_id]
//     其余每一列视为元素符号，值为质量百分比（空值 = 0，不登记）
// 流程: 解析 → 行级校验 → 批量 upsert（单事务，全部或全不）
// ==========================================

use crate::domain::material::{Composition, Material};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, RawRow, RawTable};
use crate::repository::material_repo::MaterialRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

pub const COL_MATERIAL_ID: &str = "material_id";
pub const COL_NAME: &str = "name";
pub const COL_LOCATION: &str = "location";
pub const COL_STOCK_KG: &str = "stock_kg";
pub const COL_UNIT_PRICE: &str = "unit_price";

const RESERVED_COLUMNS: [&str; 5] = [
    COL_MATERIAL_ID,
    COL_NAME,
    COL_LOCATION,
    COL_STOCK_KG,
    COL_UNIT_PRICE,
];

/// 导入结果汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogImportSummary {
    pub imported: usize,
    pub elements: Vec<String>,
}

// ==========================================
// CatalogCsvImporter
// ==========================================
pub struct CatalogCsvImporter {
    material_repo: Arc<MaterialRepository>,
}

impl CatalogCsvImporter {
    pub fn new(material_repo: Arc<MaterialRepository>) -> Self {
        Self { material_repo }
    }

    /// 导入原料目录文件
    ///
    /// # 说明
    /// - 任一行校验失败则整个文件不落库
    /// - 名称已存在的原料被覆盖（库位/成分/库存/单价）
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<CatalogImportSummary> {
        let table = CsvParser.parse_to_raw_table(file_path.as_ref())?;
        let materials = parse_catalog(&table)?;
        let imported = self.material_repo.batch_upsert(&materials)?;

        let elements = element_columns(&table.headers);
        info!(imported, elements = elements.len(), "原料目录导入完成");
        Ok(CatalogImportSummary { imported, elements })
    }
}

/// 元素列（表头中除保留列以外的列）
fn element_columns(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .filter(|h| !h.is_empty() && !RESERVED_COLUMNS.contains(&h.as_str()))
        .cloned()
        .collect()
}

/// 表格 → 原料列表（不访问数据库）
pub fn parse_catalog(table: &RawTable) -> ImportResult<Vec<Material>> {
    for required in [COL_NAME, COL_STOCK_KG, COL_UNIT_PRICE] {
        if !table.headers.iter().any(|h| h == required) {
            return Err(ImportError::MissingColumn(required.to_string()));
        }
    }

    let elements = element_columns(&table.headers);
    let mut seen_names = HashSet::new();
    let mut materials = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let name = row
            .get(COL_NAME)
            .ok_or(ImportError::NameMissing(row.row_no))?;
        if !seen_names.insert(name.to_string()) {
            return Err(ImportError::DuplicateName {
                row: row.row_no,
                name: name.to_string(),
            });
        }

        let stock_kg = parse_number(row, COL_STOCK_KG, 0.0, f64::MAX)?.unwrap_or(0.0);
        let unit_price = parse_number(row, COL_UNIT_PRICE, 0.0, f64::MAX)?.ok_or_else(|| {
            ImportError::TypeConversionError {
                row: row.row_no,
                field: COL_UNIT_PRICE.to_string(),
                message: "单价不能为空".to_string(),
            }
        })?;

        let mut composition = Composition::new();
        for element in &elements {
            if let Some(pct) = parse_number(row, element, 0.0, 100.0)? {
                composition.insert(element.clone(), pct);
            }
        }

        let mut material = Material::new(name, composition, stock_kg, unit_price);
        material.location = row.get(COL_LOCATION).map(str::to_string);
        if let Some(id) = row.get(COL_MATERIAL_ID) {
            material.material_id = id.to_string();
        }
        materials.push(material);
    }

    Ok(materials)
}

/// 解析数值列（空值返回 None）
fn parse_number(row: &RawRow, field: &str, min: f64, max: f64) -> ImportResult<Option<f64>> {
    let raw = match row.get(field) {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let value: f64 = raw.parse().map_err(|_| ImportError::TypeConversionError {
        row: row.row_no,
        field: field.to_string(),
        message: format!("无法解析为数值: {}", raw),
    })?;

    if !value.is_finite() || value < min || value > max {
        return Err(ImportError::ValueRangeError {
            row: row.row_no,
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> RawTable {
        CsvParser.parse_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_catalog_maps_element_columns() {
        let materials = parse_catalog(&table(
            "material_id,name,location,stock_kg,unit_price,Si,Mn\n\
             M-01,硅铁,A-01,1000,10,75,\n\
             ,废钢,,500,2,0.3,0.8\n",
        ))
        .unwrap();

        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].material_id, "M-01");
        assert_eq!(materials[0].location.as_deref(), Some("A-01"));
        assert_eq!(materials[0].element_pct("Si"), 75.0);
        assert!(!materials[0].composition.contains_key("Mn"));

        assert_eq!(materials[1].location, None);
        assert!(!materials[1].material_id.is_empty());
        assert_eq!(materials[1].element_pct("Mn"), 0.8);
        assert_eq!(materials[1].stock_kg, 500.0);
    }

    #[test]
    fn test_missing_required_column() {
        let result = parse_catalog(&table("name,stock_kg\nA,1\n"));
        assert!(matches!(result, Err(ImportError::MissingColumn(col)) if col == "unit_price"));
    }

    #[test]
    fn test_row_errors_name_the_row() {
        let result = parse_catalog(&table("name,stock_kg,unit_price,Si\nA,1,2,3\nB,1,2,130\n"));
        assert!(matches!(result, Err(ImportError::ValueRangeError { row: 3, .. })));

        let result = parse_catalog(&table("name,stock_kg,unit_price\nA,abc,2\n"));
        assert!(matches!(result, Err(ImportError::TypeConversionError { row: 2, .. })));

        let result = parse_catalog(&table("name,stock_kg,unit_price\nA,-1,2\n"));
        assert!(matches!(result, Err(ImportError::ValueRangeError { row: 2, .. })));

        let result = parse_catalog(&table("name,stock_kg,unit_price\nA,1,2\nA,3,4\n"));
        assert!(matches!(result, Err(ImportError::DuplicateName { row: 3, .. })));

        let result = parse_catalog(&table("name,stock_kg,unit_price\n,1,2\n"));
        assert!(matches!(result, Err(ImportError::NameMissing(2))));
    }
}
