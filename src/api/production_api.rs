// ==========================================
// 合金配料系统 - 生产记录 API
// ==========================================
// 职责: 生产记录查询、质检结果登记
// 红线: 生产记录只由投料执行创建；此处只允许修改质检字段
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::production::ProductionRecord;
use crate::domain::types::QualityStatus;
use crate::repository::production_repo::ProductionRecordRepository;

/// 单次查询记录数上限
pub const MAX_LIST_LIMIT: usize = 1000;

// ==========================================
// ProductionApi - 生产记录 API
// ==========================================
pub struct ProductionApi {
    production_repo: Arc<ProductionRecordRepository>,
}

impl ProductionApi {
    pub fn new(production_repo: Arc<ProductionRecordRepository>) -> Self {
        Self { production_repo }
    }

    /// 查询生产记录（按生产时间倒序）
    ///
    /// # 参数
    /// - product_name: 可选产品过滤
    /// - limit: 返回记录数上限（1..=1000）
    pub fn list_production_records(
        &self,
        product_name: Option<&str>,
        limit: usize,
    ) -> ApiResult<Vec<ProductionRecord>> {
        if limit == 0 || limit > MAX_LIST_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "limit 必须在 1..={} 之间: {}",
                MAX_LIST_LIMIT, limit
            )));
        }

        let records = match product_name.map(str::trim) {
            Some("") => return Err(ApiError::InvalidInput("产品名称不能为空".to_string())),
            Some(product) => self.production_repo.list_by_product(product, limit)?,
            None => self.production_repo.list_recent(limit)?,
        };
        Ok(records)
    }

    /// 查询单条生产记录
    pub fn get_production_record(&self, record_id: &str) -> ApiResult<ProductionRecord> {
        self.production_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("生产记录 {}", record_id)))
    }

    /// 登记质检结果
    ///
    /// # 参数
    /// - status: PASSED / FAILED（不允许回到 PENDING）
    pub fn update_quality(
        &self,
        record_id: &str,
        status: QualityStatus,
        note: Option<&str>,
    ) -> ApiResult<()> {
        if status == QualityStatus::Pending {
            return Err(ApiError::InvalidInput("质检结果只能登记为 PASSED 或 FAILED".to_string()));
        }

        self.production_repo.update_quality(record_id, status, note)?;
        info!(record_id = %record_id, %status, "质检结果已登记");
        Ok(())
    }
}
