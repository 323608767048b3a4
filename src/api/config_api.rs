// ==========================================
// 合金配料系统 - 配置管理 API
// ==========================================
// 职责: 配置快照查询、配置更新
// 说明: 配置在 AppState 构建时读取，更新后下次启动生效
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, validate_config_value, ConfigManager};

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 获取配置快照（JSON，未设置的键以默认值补齐）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// 更新配置
    ///
    /// # 参数
    /// - key: 必须是已知配置键
    /// - value: 配置值（须能被对应的读取规则解析）
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let key = key.trim();
        if !config_keys::DEFAULTS.iter().any(|(k, _)| *k == key) {
            return Err(ApiError::InvalidInput(format!("未知配置键: {}", key)));
        }
        if value.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!("配置值不能为空: {}", key)));
        }
        validate_config_value(key, value).map_err(ApiError::InvalidInput)?;

        self.config_manager
            .set_config(key, value.trim())
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        info!(key = %key, value = %value.trim(), "配置已更新");
        Ok(())
    }
}
