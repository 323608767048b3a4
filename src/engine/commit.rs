// ==========================================
// 合金配料系统 - 投料执行协调器
// ==========================================
// 红线: 加锁读库存 → 校验 → 扣减 → 写生产记录 → 提交，全部或全不
// 红线: 任何一步失败都回滚，不产生部分扣减
// ==========================================
// 锁序: 按原料名称升序加锁
// 校验与扣减: 按配方行顺序
// ==========================================

use crate::domain::production::{required_amount, MaterialUsage, ProductionRecord};
use crate::domain::recipe::Recipe;
use crate::domain::types::ExecutionStatus;
use crate::engine::error::{BlendError, BlendResult};
use crate::repository::catalog::{InventoryStore, StockUnitOfWork};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 配方占比合计允许偏离 100 的幅度（百分点）
pub const DEFAULT_RECIPE_SUM_TOLERANCE_PCT: f64 = 0.1;

/// 每个配方行取整（两位小数）可能带来的最大偏差（百分点）
pub const ROUNDING_DRIFT_PER_LINE_PCT: f64 = 0.005;

/// 默认操作人
pub const DEFAULT_OPERATOR: &str = "system";

// ==========================================
// ExecutionRequest - 投料请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub product_name: String,
    pub target_amount_kg: f64,
    pub recipe: Recipe,
    #[serde(default)]
    pub operator: Option<String>,
}

// ==========================================
// ExecutionReceipt - 投料回执
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub status: ExecutionStatus,
    pub record_id: String,
    pub materials_used: Vec<MaterialUsage>,
}

// ==========================================
// InventoryCommitCoordinator
// ==========================================
pub struct InventoryCommitCoordinator {
    store: Arc<dyn InventoryStore>,
    sum_tolerance_pct: f64,
    default_operator: String,
}

impl InventoryCommitCoordinator {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            store,
            sum_tolerance_pct: DEFAULT_RECIPE_SUM_TOLERANCE_PCT,
            default_operator: DEFAULT_OPERATOR.to_string(),
        }
    }

    pub fn with_sum_tolerance(mut self, tolerance_pct: f64) -> Self {
        self.sum_tolerance_pct = tolerance_pct;
        self
    }

    pub fn with_default_operator(mut self, operator: &str) -> Self {
        self.default_operator = operator.to_string();
        self
    }

    /// 执行投料
    ///
    /// # 错误
    /// - InvalidExecutionRequest: 请求字段缺失/非法
    /// - MaterialNotFound / InsufficientStock: 校验失败，已回滚
    /// - TransactionAbort: 加锁后的意外失败，已回滚
    #[instrument(skip(self, request), fields(product = %request.product_name, target_kg = request.target_amount_kg))]
    pub fn execute(&self, request: &ExecutionRequest) -> BlendResult<ExecutionReceipt> {
        self.validate(request)?;

        let operator = request
            .operator
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.default_operator.as_str());

        let record = ProductionRecord::from_recipe(
            request.product_name.trim(),
            request.target_amount_kg,
            &request.recipe,
            operator,
        );

        let mut uow = self
            .store
            .begin()
            .map_err(|e| BlendError::TransactionAbort(format!("事务开启失败: {}", e)))?;

        match apply_in_unit(uow.as_mut(), &request.recipe, request.target_amount_kg, &record) {
            Ok(()) => {}
            Err(err) => {
                if let Err(rollback_err) = uow.rollback() {
                    warn!(error = %rollback_err, "投料事务回滚失败");
                }
                if let BlendError::InsufficientStock {
                    material_name,
                    required_kg,
                    available_kg,
                } = &err
                {
                    warn!(%material_name, required_kg, available_kg, "库存不足，投料已回滚");
                }
                return Err(err);
            }
        }

        uow.commit()
            .map_err(|e| BlendError::TransactionAbort(format!("事务提交失败: {}", e)))?;

        info!(record_id = %record.record_id, lines = record.materials_used.len(), "投料执行完成");

        Ok(ExecutionReceipt {
            status: ExecutionStatus::Executed,
            record_id: record.record_id,
            materials_used: record.materials_used,
        })
    }

    /// 合计容差: 配置值与逐行取整余量取大者
    fn effective_sum_tolerance(&self, line_count: usize) -> f64 {
        self.sum_tolerance_pct
            .max(ROUNDING_DRIFT_PER_LINE_PCT * line_count as f64)
    }

    fn validate(&self, request: &ExecutionRequest) -> BlendResult<()> {
        if request.product_name.trim().is_empty() {
            return Err(BlendError::InvalidExecutionRequest("产品名称不能为空".to_string()));
        }
        if !request.target_amount_kg.is_finite() || request.target_amount_kg <= 0.0 {
            return Err(BlendError::InvalidExecutionRequest(format!(
                "目标产量必须为正数: {}",
                request.target_amount_kg
            )));
        }
        if request.recipe.is_empty() {
            return Err(BlendError::InvalidExecutionRequest("配方不能为空".to_string()));
        }

        let mut seen = BTreeSet::new();
        for line in &request.recipe.lines {
            if line.material_name.trim().is_empty() {
                return Err(BlendError::InvalidExecutionRequest("配方行原料名称不能为空".to_string()));
            }
            if !line.percentage.is_finite() || line.percentage <= 0.0 || line.percentage > 100.0 {
                return Err(BlendError::InvalidExecutionRequest(format!(
                    "配方行 {} 占比非法: {}",
                    line.material_name, line.percentage
                )));
            }
            if !seen.insert(line.material_name.as_str()) {
                return Err(BlendError::InvalidExecutionRequest(format!(
                    "配方原料重复: {}",
                    line.material_name
                )));
            }
        }

        let total = request.recipe.total_percentage();
        let tolerance = self.effective_sum_tolerance(request.recipe.lines.len());
        if (total - 100.0).abs() > tolerance {
            return Err(BlendError::InvalidExecutionRequest(format!(
                "配方占比合计 {:.4} 偏离 100 超过 {:.4}",
                total, tolerance
            )));
        }
        Ok(())
    }
}

/// 在事务单元内完成加锁、校验、扣减与记录写入（不提交）
fn apply_in_unit<U: StockUnitOfWork + ?Sized>(
    uow: &mut U,
    recipe: &Recipe,
    target_amount_kg: f64,
    record: &ProductionRecord,
) -> BlendResult<()> {
    let abort = |e: crate::repository::RepositoryError| BlendError::TransactionAbort(e.to_string());

    let lock_order: BTreeSet<&str> = recipe.lines.iter().map(|l| l.material_name.as_str()).collect();
    let mut stocks: HashMap<&str, Option<f64>> = HashMap::new();
    for name in lock_order {
        let stock = uow.lock_and_read_stock(name).map_err(abort)?;
        stocks.insert(name, stock);
    }

    let mut plan = Vec::with_capacity(recipe.lines.len());
    for line in &recipe.lines {
        let required_kg = required_amount(target_amount_kg, line.percentage);
        let available_kg = match stocks.get(line.material_name.as_str()).copied().flatten() {
            Some(stock) => stock,
            None => {
                return Err(BlendError::MaterialNotFound {
                    material_name: line.material_name.clone(),
                })
            }
        };
        if available_kg < required_kg {
            return Err(BlendError::InsufficientStock {
                material_name: line.material_name.clone(),
                required_kg,
                available_kg,
            });
        }
        plan.push((line.material_name.as_str(), required_kg));
    }

    for (name, required_kg) in plan {
        uow.deduct_stock(name, required_kg).map_err(abort)?;
    }
    uow.insert_production_record(record).map_err(abort)?;
    Ok(())
}
