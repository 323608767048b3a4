// ==========================================
// 合金配料系统 - 原料 API
// ==========================================
// 职责: 原料目录查询、目录导入、入库
// 说明: 出库（扣减）只走投料执行事务
// ==========================================

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::dto::MaterialView;
use crate::api::error::{ApiError, ApiResult};
use crate::importer::catalog_csv::{CatalogCsvImporter, CatalogImportSummary};
use crate::repository::material_repo::MaterialRepository;

// ==========================================
// MaterialApi - 原料 API
// ==========================================
pub struct MaterialApi {
    material_repo: Arc<MaterialRepository>,
    importer: CatalogCsvImporter,
}

impl MaterialApi {
    /// 创建新的MaterialApi实例
    pub fn new(material_repo: Arc<MaterialRepository>) -> Self {
        Self {
            importer: CatalogCsvImporter::new(material_repo.clone()),
            material_repo,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询原料列表
    ///
    /// # 参数
    /// - eligible_only: 仅返回库存 > 0 的原料
    pub fn list_materials(&self, eligible_only: bool) -> ApiResult<Vec<MaterialView>> {
        let materials = if eligible_only {
            self.material_repo.list_eligible()?
        } else {
            self.material_repo.list_all()?
        };
        debug!(count = materials.len(), eligible_only, "查询原料列表");
        Ok(materials.into_iter().map(MaterialView::from).collect())
    }

    /// 按名称查询原料
    pub fn get_material(&self, name: &str) -> ApiResult<MaterialView> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("原料名称不能为空".to_string()));
        }
        self.material_repo
            .find_by_name(name.trim())?
            .map(MaterialView::from)
            .ok_or_else(|| ApiError::NotFound(format!("原料 {}", name)))
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 导入原料目录 CSV
    pub fn import_catalog(&self, file_path: &Path) -> ApiResult<CatalogImportSummary> {
        let summary = self.importer.import_file(file_path)?;
        Ok(summary)
    }

    /// 原料入库
    ///
    /// # 返回
    /// - Ok(f64): 入库后的库存
    pub fn restock(&self, name: &str, amount_kg: f64) -> ApiResult<f64> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("原料名称不能为空".to_string()));
        }
        let stock = self.material_repo.add_stock(name.trim(), amount_kg)?;
        info!(material = %name, amount_kg, stock_kg = stock, "原料入库");
        Ok(stock)
    }
}
