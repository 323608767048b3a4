// ==========================================
// 合金配料系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{BlendApi, ConfigApi, MaterialApi, ProductionApi};
use crate::config::{BlendConfigReader, ConfigManager};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{BlendOrchestrator, InventoryCommitCoordinator};
use crate::repository::{MaterialRepository, ProductionRecordRepository, SqliteInventoryStore};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配料API（计算配方 / 投料执行）
    pub blend_api: Arc<BlendApi>,

    /// 原料API
    pub material_api: Arc<MaterialApi>,

    /// 生产记录API
    pub production_api: Arc<ProductionApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 按配置初始化Engine
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let material_repo = Arc::new(MaterialRepository::from_connection(conn.clone()));
        let production_repo = Arc::new(ProductionRecordRepository::from_connection(conn.clone()));
        let inventory_store = Arc::new(SqliteInventoryStore::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let orchestrator = Arc::new(
            BlendOrchestrator::from_config(config_manager.as_ref())
                .map_err(|e| format!("无法读取求解配置: {}", e))?,
        );

        let tolerance = config_manager
            .get_recipe_sum_tolerance_pct()
            .map_err(|e| format!("无法读取投料配置: {}", e))?;
        let operator = config_manager
            .get_default_operator()
            .map_err(|e| format!("无法读取投料配置: {}", e))?;
        let coordinator = Arc::new(
            InventoryCommitCoordinator::new(inventory_store)
                .with_sum_tolerance(tolerance)
                .with_default_operator(&operator),
        );

        // ==========================================
        // 创建API实例
        // ==========================================
        let blend_api = Arc::new(BlendApi::new(
            material_repo.clone(),
            orchestrator,
            coordinator,
        ));
        let material_api = Arc::new(MaterialApi::new(material_repo));
        let production_api = Arc::new(ProductionApi::new(production_repo));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            blend_api,
            material_api,
            production_api,
            config_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: ALLOY_BLEND_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("ALLOY_BLEND_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./alloy_blend.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("alloy-blend");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("alloy_blend.db");
        }
    }

    path.to_string_lossy().to_string()
}
