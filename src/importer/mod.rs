// ==========================================
// 合金配料系统 - 导入层
// ==========================================
// 职责: 外部原料目录导入，生成 material 表数据
// 支持: CSV
// ==========================================

pub mod catalog_csv;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use catalog_csv::{parse_catalog, CatalogCsvImporter, CatalogImportSummary};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, RawRow, RawTable};
