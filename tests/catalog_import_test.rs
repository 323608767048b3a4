// ==========================================
// 原料目录导入集成测试
// ==========================================
// 流程: CSV 文件 → MaterialApi::import_catalog → 配方计算
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod catalog_import_test {
    use alloy_blend::logging;
    use alloy_blend::api::{ApiError, ComputeRecipeRequest};
    use alloy_blend::app::AppState;
    use alloy_blend::domain::{ElementBound, RecipeLine, RequirementSet};
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::test_helpers::create_test_db;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn setup() -> (NamedTempFile, AppState) {
        logging::init_test();
        let (temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path).unwrap();
        (temp_file, state)
    }

    #[test]
    fn test_import_then_optimize() {
        let (_db, state) = setup();
        let csv = write_csv(
            "name,location,stock_kg,unit_price,Si\n\
             A,库位-1,1000,10,100\n\
             B,库位-2,1000,2,\n",
        );

        let summary = state.material_api.import_catalog(csv.path()).unwrap();
        assert_eq!(summary.imported, 2);
        assert!(summary.elements.contains(&"Si".to_string()));

        let a = state.material_api.get_material("A").unwrap();
        assert_eq!(a.location.as_deref(), Some("库位-1"));
        assert_eq!(a.composition.get("Si"), Some(&100.0));
        assert!(a.eligible);

        // 空值不登记
        let b = state.material_api.get_material("B").unwrap();
        assert!(b.composition.is_empty());

        let response = state
            .blend_api
            .compute_recipe(&ComputeRecipeRequest {
                requirements: RequirementSet::new().with("Si", ElementBound::between(30.0, 40.0)),
            })
            .unwrap();
        assert_eq!(
            response.recipe,
            vec![RecipeLine::new("A", 30.0), RecipeLine::new("B", 70.0)]
        );
    }

    #[test]
    fn test_reimport_updates_existing_material() {
        let (_db, state) = setup();
        let first = write_csv("name,stock_kg,unit_price,Si\nA,1000,10,100\n");
        state.material_api.import_catalog(first.path()).unwrap();
        let original_id = state.material_api.get_material("A").unwrap().material_id;

        let second = write_csv("name,stock_kg,unit_price,Si\nA,0,12,99\n");
        state.material_api.import_catalog(second.path()).unwrap();

        let a = state.material_api.get_material("A").unwrap();
        assert_eq!(a.material_id, original_id);
        assert_eq!(a.stock_kg, 0.0);
        assert_eq!(a.unit_price, 12.0);
        assert!(!a.eligible);
        assert!(state.material_api.list_materials(true).unwrap().is_empty());
        assert_eq!(state.material_api.list_materials(false).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_file_imports_nothing() {
        let (_db, state) = setup();
        let csv = write_csv(
            "name,stock_kg,unit_price,Si\n\
             A,1000,10,100\n\
             B,1000,2,150\n",
        );

        let result = state.material_api.import_catalog(csv.path());
        assert!(matches!(result, Err(ApiError::ImportError(_))));
        assert!(state.material_api.list_materials(false).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_db, state) = setup();
        let result = state
            .material_api
            .import_catalog(std::path::Path::new("/nonexistent/catalog.csv"));
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
