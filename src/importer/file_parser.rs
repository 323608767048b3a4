// ==========================================
// 合金配料系统 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv)，首行为表头
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 解析后的原始表格（表头顺序保留，行按表头取值）
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// 原始行
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub row_no: usize, // 文件中的行号（表头为第 1 行）
    pub values: HashMap<String, String>,
}

impl RawRow {
    /// 取去空白后的非空值
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    pub fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        self.parse_reader(file)
    }

    /// 从任意输入流解析
    pub fn parse_reader<R: std::io::Read>(&self, input: R) -> ImportResult<RawTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut values = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    values.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if values.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                row_no: row_idx + 2,
                values,
            });
        }

        Ok(RawTable { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = csv_file(&["name, stock_kg ,Si", "硅铁,1000,75", "废钢, 500 ,"]);

        let table = CsvParser.parse_to_raw_table(file.path()).unwrap();

        assert_eq!(table.headers, vec!["name", "stock_kg", "Si"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_no, 2);
        assert_eq!(table.rows[0].get("name"), Some("硅铁"));
        assert_eq!(table.rows[1].get("stock_kg"), Some("500"));
        assert_eq!(table.rows[1].get("Si"), None);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_table(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_rejects_other_extensions() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let result = CsvParser.parse_to_raw_table(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let table = CsvParser
            .parse_reader("name,stock_kg\nA,2.5\n,\nB,3.0\n".as_bytes())
            .unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].row_no, 4);
    }
}
