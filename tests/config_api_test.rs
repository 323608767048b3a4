// ==========================================
// ConfigApi 集成测试
// ==========================================
// 测试范围:
// 1. 配置快照: 默认值补齐
// 2. 配置更新: 已知键 / 未知键 / 空值 / 非法值
// 3. 生效时机: 下次构建 AppState 时读取
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod config_api_test {
    use alloy_blend::api::{ApiError, ComputeRecipeRequest, ExecuteProductionRequest};
    use alloy_blend::app::AppState;
    use alloy_blend::domain::{ElementBound, RecipeLine, RequirementSet};
    use alloy_blend::logging;
    use serde_json::Value;

    use crate::test_helpers::{create_test_db, seed_materials, si_catalog};

    fn snapshot(state: &AppState) -> Value {
        let raw = state.config_api.get_config_snapshot().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_snapshot_contains_defaults() {
        logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path).unwrap();

        let json = snapshot(&state);
        assert_eq!(json["percentage_decimals"], "2");
        assert_eq!(json["recipe_sum_tolerance_pct"], "0.1");
        assert_eq!(json["default_operator"], "system");
    }

    #[test]
    fn test_update_known_and_unknown_keys() {
        logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path).unwrap();

        state
            .config_api
            .update_config("default_operator", " 夜班 ")
            .unwrap();
        assert_eq!(snapshot(&state)["default_operator"], "夜班");

        assert!(matches!(
            state.config_api.update_config("no_such_key", "1"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.config_api.update_config("default_operator", "  "),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unparsable_value_rejected_and_not_stored() {
        logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path).unwrap();

        for (key, value) in [
            ("percentage_decimals", "abc"),
            ("solver_max_iterations", "0"),
            ("recipe_sum_tolerance_pct", "-1"),
        ] {
            assert!(
                matches!(
                    state.config_api.update_config(key, value),
                    Err(ApiError::InvalidInput(_))
                ),
                "{}={} should be rejected",
                key,
                value
            );
        }

        let json = snapshot(&state);
        assert_eq!(json["percentage_decimals"], "2");
        assert_eq!(json["solver_max_iterations"], "10000");
        assert_eq!(json["recipe_sum_tolerance_pct"], "0.1");
    }

    #[test]
    fn test_config_applies_on_next_start() {
        logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        seed_materials(&db_path, &si_catalog(1000.0, 1000.0)).unwrap();

        let state = AppState::new(db_path.clone()).unwrap();
        state
            .config_api
            .update_config("default_operator", "夜班")
            .unwrap();
        state
            .config_api
            .update_config("recipe_sum_tolerance_pct", "0.001")
            .unwrap();
        state
            .config_api
            .update_config("solver_max_iterations", "1")
            .unwrap();
        drop(state);

        let state = AppState::new(db_path).unwrap();

        // 33.33 + 66.63 = 99.96，默认容差可接受，超出 0.001 及两行取整余量
        let result = state.blend_api.execute_production(ExecuteProductionRequest {
            product_name: "P".to_string(),
            target_amount: 10.0,
            recipe: vec![RecipeLine::new("A", 33.33), RecipeLine::new("B", 66.63)],
            operator: None,
        });
        assert!(matches!(result, Err(ApiError::InvalidExecutionRequest(_))));

        let executed = state
            .blend_api
            .execute_production(ExecuteProductionRequest {
                product_name: "P".to_string(),
                target_amount: 10.0,
                recipe: vec![RecipeLine::new("B", 100.0)],
                operator: None,
            })
            .unwrap();
        let record = state
            .production_api
            .get_production_record(&executed.record_id)
            .unwrap();
        assert_eq!(record.operator, "夜班");

        // 迭代上限为 1，两阶段单纯形无法完成
        let result = state.blend_api.compute_recipe(&ComputeRecipeRequest {
            requirements: RequirementSet::new().with("Si", ElementBound::between(30.0, 40.0)),
        });
        assert!(matches!(result, Err(ApiError::SolverFailure(_))));
    }
}
