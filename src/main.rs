// ==========================================
// 合金配料系统 - 命令行入口
// ==========================================
// 输出: stdout 只输出 JSON 结果；日志写 stderr
// 退出码: 0 成功 / 1 业务错误（JSON 错误对象）/ 2 启动失败
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;

use alloy_blend::api::{ApiError, ApiResult, ComputeRecipeRequest, ExecuteProductionRequest};
use alloy_blend::app::{get_default_db_path, AppState};
use alloy_blend::domain::QualityStatus;
use alloy_blend::logging::{self, LogFormat};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

/// 合金配料: 最低成本配方计算与投料库存扣减
#[derive(Parser)]
#[command(name = "alloy-blend", version)]
struct Cli {
    /// SQLite 数据库路径
    #[arg(long, env = "ALLOY_BLEND_DB_PATH")]
    db: Option<PathBuf>,

    /// 日志以 JSON 行输出到 stderr
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 建表（幂等）
    InitDb,

    /// 从 CSV 导入原料目录
    ImportCatalog {
        /// CSV 文件: name, location, stock_kg, unit_price, [material_id], 元素列...
        file: PathBuf,
    },

    /// 列出原料
    ListMaterials {
        /// 仅列出库存 > 0 的原料
        #[arg(long)]
        eligible_only: bool,
    },

    /// 原料入库
    Restock {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount_kg: f64,
    },

    /// 计算最低成本配方
    Optimize {
        /// 成分要求 JSON，如 '{"Si":{"min":30,"max":40}}'，或 @文件
        #[arg(long)]
        requirements: String,
    },

    /// 按配方投料，原子扣减库存
    Execute {
        #[arg(long)]
        product: String,
        #[arg(long)]
        target_kg: f64,
        /// 配方 JSON，如 '[{"name":"A","percentage":30}]'，或 @文件
        #[arg(long)]
        recipe: String,
        #[arg(long)]
        operator: Option<String>,
    },

    /// 列出生产记录（最新在前）
    ListProductions {
        #[arg(long)]
        product: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// 登记生产记录的质检结果
    SetQuality {
        #[arg(long)]
        record_id: String,
        #[arg(long, value_enum)]
        status: QualityArg,
        #[arg(long)]
        note: Option<String>,
    },

    /// 输出当前生效配置
    ShowConfig,

    /// 更新配置项
    SetConfig {
        #[arg(long)]
        key: String,
        #[arg(long)]
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    Passed,
    Failed,
}

impl From<QualityArg> for QualityStatus {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Passed => QualityStatus::Passed,
            QualityArg::Failed => QualityStatus::Failed,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let db_path = cli
        .db
        .clone()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);

    let state = match AppState::new(db_path).map_err(anyhow::Error::msg) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("启动失败: {:#}", e);
            return ExitCode::from(2);
        }
    };

    match run(&state, cli.command) {
        Ok(Ok(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(Err(api_err)) => {
            let body = json!({ "error": api_err.code(), "message": api_err.to_string() });
            println!("{}", body);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// 外层 Result: 参数/输入读取失败；内层 ApiResult: 业务结果
fn run(state: &AppState, command: Command) -> anyhow::Result<ApiResult<Value>> {
    let result = match command {
        Command::InitDb => Ok(json!({ "db_path": state.db_path, "status": "ready" })),

        Command::ImportCatalog { file } => state
            .material_api
            .import_catalog(&file)
            .and_then(to_json),

        Command::ListMaterials { eligible_only } => state
            .material_api
            .list_materials(eligible_only)
            .and_then(to_json),

        Command::Restock { name, amount_kg } => state
            .material_api
            .restock(&name, amount_kg)
            .map(|stock_kg| json!({ "name": name, "stock_kg": stock_kg })),

        Command::Optimize { requirements } => {
            let text = read_json_arg(&requirements).context("无法读取 --requirements")?;
            ComputeRecipeRequest::from_requirements_json(&text)
                .and_then(|request| state.blend_api.compute_recipe(&request))
                .and_then(to_json)
        }

        Command::Execute {
            product,
            target_kg,
            recipe,
            operator,
        } => {
            let text = read_json_arg(&recipe).context("无法读取 --recipe")?;
            ExecuteProductionRequest::parse_recipe_json(&text)
                .and_then(|recipe| {
                    state.blend_api.execute_production(ExecuteProductionRequest {
                        product_name: product,
                        target_amount: target_kg,
                        recipe,
                        operator,
                    })
                })
                .and_then(to_json)
        }

        Command::ListProductions { product, limit } => state
            .production_api
            .list_production_records(product.as_deref(), limit)
            .and_then(to_json),

        Command::SetQuality {
            record_id,
            status,
            note,
        } => state
            .production_api
            .update_quality(&record_id, status.into(), note.as_deref())
            .map(|()| json!({ "record_id": record_id, "status": "updated" })),

        Command::ShowConfig => state
            .config_api
            .get_config_snapshot()
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| ApiError::InternalError(e.to_string()))),

        Command::SetConfig { key, value } => state
            .config_api
            .update_config(&key, &value)
            .map(|()| json!({ "key": key, "value": value })),
    };
    Ok(result)
}

fn to_json<T: serde::Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::InternalError(e.to_string()))
}

/// 读取 JSON 参数文本（以 @ 开头时从文件读取，解析交给 API 层）
fn read_json_arg(raw: &str) -> anyhow::Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("读取 {} 失败", path)),
        None => Ok(raw.to_string()),
    }
}
