// ==========================================
// 合金配料系统 - 配料 API
// ==========================================
// 职责: 计算最低成本配方、执行投料
// 红线: 计算阶段只读目录快照；投料阶段重新加锁校验库存（计算结果不构成预留）
// ==========================================

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::api::dto::{
    ComputeRecipeRequest, ComputeRecipeResponse, ExecuteProductionRequest,
    ExecuteProductionResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::engine::commit::InventoryCommitCoordinator;
use crate::engine::orchestrator::BlendOrchestrator;
use crate::repository::catalog::MaterialCatalog;

// ==========================================
// BlendApi - 配料 API
// ==========================================
pub struct BlendApi {
    catalog: Arc<dyn MaterialCatalog>,
    orchestrator: Arc<BlendOrchestrator>,
    coordinator: Arc<InventoryCommitCoordinator>,
}

impl BlendApi {
    /// 创建新的BlendApi实例
    ///
    /// # 参数
    /// - catalog: 原料目录（只读快照）
    /// - orchestrator: 优化编排器
    /// - coordinator: 投料执行协调器
    pub fn new(
        catalog: Arc<dyn MaterialCatalog>,
        orchestrator: Arc<BlendOrchestrator>,
        coordinator: Arc<InventoryCommitCoordinator>,
    ) -> Self {
        Self {
            catalog,
            orchestrator,
            coordinator,
        }
    }

    /// 计算最低成本配方
    ///
    /// # 返回
    /// - Ok(ComputeRecipeResponse): 占比（两位小数）+ 每 kg 成本
    /// - Err(ApiError::InvalidRequirement / NoFeasibleRecipe / SolverFailure)
    #[instrument(skip(self, request), fields(elements = request.requirements.len()))]
    pub fn compute_recipe(&self, request: &ComputeRecipeRequest) -> ApiResult<ComputeRecipeResponse> {
        let catalog = self.catalog.list_eligible_materials()?;

        let recipe = self
            .orchestrator
            .optimize(&request.requirements, &catalog)
            .map_err(|e| {
                warn!(error = %e, "配方计算失败");
                ApiError::from(e)
            })?;

        Ok(recipe.into())
    }

    /// 执行投料
    ///
    /// # 返回
    /// - Ok(ExecuteProductionResponse): status = executed
    /// - Err(ApiError): 库存未发生任何变化
    #[instrument(skip(self, request), fields(product = %request.product_name))]
    pub fn execute_production(
        &self,
        request: ExecuteProductionRequest,
    ) -> ApiResult<ExecuteProductionResponse> {
        let receipt = self.coordinator.execute(&request.into_execution_request())?;

        info!(record_id = %receipt.record_id, "投料执行成功");
        Ok(ExecuteProductionResponse {
            status: receipt.status,
            record_id: receipt.record_id,
            materials_used: receipt.materials_used,
        })
    }
}
