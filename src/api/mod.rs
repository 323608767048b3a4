// ==========================================
// 合金配料系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行调用
// ==========================================

pub mod blend_api;
pub mod config_api;
pub mod dto;
pub mod error;
pub mod material_api;
pub mod production_api;

// 重导出核心类型
pub use blend_api::BlendApi;
pub use config_api::ConfigApi;
pub use dto::{
    ComputeRecipeRequest, ComputeRecipeResponse, ExecuteProductionRequest,
    ExecuteProductionResponse, MaterialView,
};
pub use error::{ApiError, ApiResult};
pub use material_api::MaterialApi;
pub use production_api::ProductionApi;
