// ==========================================
// 合金配料系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::blend_config_trait::BlendConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::commit::{DEFAULT_OPERATOR, DEFAULT_RECIPE_SUM_TOLERANCE_PCT};
use crate::engine::interpreter::{DEFAULT_PERCENTAGE_DECIMALS, DEFAULT_SOLUTION_EPSILON};
use crate::engine::simplex::DEFAULT_MAX_ITERATIONS;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_config(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): 配置快照的JSON字符串（未落库的配置项以默认值补齐）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let mut config_map: BTreeMap<String, String> = config_keys::DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// BlendConfigReader Trait 实现
// ==========================================
impl BlendConfigReader for ConfigManager {
    fn get_solution_epsilon(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::SOLUTION_EPSILON, "1e-9")?;
        Ok(parse_non_negative_f64(&value).unwrap_or(DEFAULT_SOLUTION_EPSILON))
    }

    fn get_percentage_decimals(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::PERCENTAGE_DECIMALS, "2")?;
        Ok(parse_decimals(&value).unwrap_or(DEFAULT_PERCENTAGE_DECIMALS))
    }

    fn get_solver_max_iterations(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::SOLVER_MAX_ITERATIONS, "10000")?;
        Ok(parse_positive_usize(&value).unwrap_or(DEFAULT_MAX_ITERATIONS))
    }

    fn get_recipe_sum_tolerance_pct(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::RECIPE_SUM_TOLERANCE_PCT, "0.1")?;
        Ok(parse_non_negative_f64(&value).unwrap_or(DEFAULT_RECIPE_SUM_TOLERANCE_PCT))
    }

    fn get_default_operator(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_OPERATOR, DEFAULT_OPERATOR)?;
        let value = value.trim();
        if value.is_empty() {
            Ok(DEFAULT_OPERATOR.to_string())
        } else {
            Ok(value.to_string())
        }
    }
}

// ==========================================
// 配置值解析（读取与写入共用同一规则）
// ==========================================
fn parse_non_negative_f64(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_decimals(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|d| *d <= 6)
}

fn parse_positive_usize(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// 校验配置值能被对应的读取规则接受
///
/// # 返回
/// - Err(String): 未知键或值不合法的原因
pub fn validate_config_value(key: &str, value: &str) -> Result<(), String> {
    let accepted = match key {
        config_keys::SOLUTION_EPSILON | config_keys::RECIPE_SUM_TOLERANCE_PCT => {
            parse_non_negative_f64(value).is_some()
        }
        config_keys::PERCENTAGE_DECIMALS => parse_decimals(value).is_some(),
        config_keys::SOLVER_MAX_ITERATIONS => parse_positive_usize(value).is_some(),
        config_keys::DEFAULT_OPERATOR => !value.trim().is_empty(),
        _ => return Err(format!("未知配置键: {}", key)),
    };
    if accepted {
        Ok(())
    } else {
        Err(format!("配置 {} 的值不合法: {}", key, value))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 配方解释
    pub const SOLUTION_EPSILON: &str = "solution_epsilon";
    pub const PERCENTAGE_DECIMALS: &str = "percentage_decimals";

    // 求解器
    pub const SOLVER_MAX_ITERATIONS: &str = "solver_max_iterations";

    // 投料执行
    pub const RECIPE_SUM_TOLERANCE_PCT: &str = "recipe_sum_tolerance_pct";
    pub const DEFAULT_OPERATOR: &str = "default_operator";

    /// 全部配置键及默认值
    pub const DEFAULTS: &[(&str, &str)] = &[
        (SOLUTION_EPSILON, "1e-9"),
        (PERCENTAGE_DECIMALS, "2"),
        (SOLVER_MAX_ITERATIONS, "10000"),
        (RECIPE_SUM_TOLERANCE_PCT, "0.1"),
        (DEFAULT_OPERATOR, "system"),
    ];
}
