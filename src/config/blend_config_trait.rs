// ==========================================
// 合金配料系统 - 配料配置读取 Trait
// ==========================================
// 职责: 定义优化链路与投料执行所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::error::Error;

// ==========================================
// BlendConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait BlendConfigReader: Send + Sync {
    // ===== 配方解释 =====

    /// 求解结果噪声阈值（小于等于该值的配比视为 0）
    ///
    /// # 默认值
    /// - 1e-9
    fn get_solution_epsilon(&self) -> Result<f64, Box<dyn Error>>;

    /// 配方占比 / 成本保留的小数位
    ///
    /// # 默认值
    /// - 2
    fn get_percentage_decimals(&self) -> Result<u32, Box<dyn Error>>;

    // ===== 求解器 =====

    /// 单纯形最大迭代次数
    ///
    /// # 默认值
    /// - 10000
    fn get_solver_max_iterations(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 投料执行 =====

    /// 配方占比合计允许偏离 100 的幅度（百分点）
    ///
    /// # 默认值
    /// - 0.1
    fn get_recipe_sum_tolerance_pct(&self) -> Result<f64, Box<dyn Error>>;

    /// 请求未指定操作人时记录的默认操作人
    ///
    /// # 默认值
    /// - "system"
    fn get_default_operator(&self) -> Result<String, Box<dyn Error>>;
}
