// ==========================================
// 并发投料执行测试
// ==========================================
// 场景: 多个独立连接同时对同一原料投料
// 期望: 总扣减不超过初始库存，失败方得到 InsufficientStock
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod concurrent_execution_test {
    use alloy_blend::logging;
    use alloy_blend::domain::{Recipe, RecipeLine};
    use alloy_blend::engine::{BlendError, ExecutionRequest, InventoryCommitCoordinator};
    use alloy_blend::repository::{MaterialRepository, ProductionRecordRepository, SqliteInventoryStore};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::test_helpers::{create_test_db, seed_materials, si_catalog};

    fn request(product: &str, target_kg: f64, lines: &[(&str, f64)]) -> ExecutionRequest {
        ExecutionRequest {
            product_name: product.to_string(),
            target_amount_kg: target_kg,
            recipe: Recipe::from_lines(
                lines
                    .iter()
                    .map(|(name, pct)| RecipeLine::new(name, *pct))
                    .collect(),
            ),
            operator: None,
        }
    }

    /// 每个线程持有独立连接，模拟多个进程同时执行
    fn run_concurrently(db_path: &str, requests: Vec<ExecutionRequest>) -> Vec<Result<String, BlendError>> {
        logging::init_test();
        let barrier = Arc::new(Barrier::new(requests.len()));
        let handles: Vec<_> = requests
            .into_iter()
            .map(|req| {
                let db_path = db_path.to_string();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let store = SqliteInventoryStore::new(&db_path).unwrap();
                    let coordinator = InventoryCommitCoordinator::new(Arc::new(store));
                    barrier.wait();
                    coordinator.execute(&req).map(|receipt| receipt.record_id)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_overlapping_executions_never_oversell() {
        let (_tmp, db_path) = create_test_db().unwrap();
        seed_materials(&db_path, &si_catalog(100.0, 1000.0)).unwrap();

        // 每个请求需要 A 60kg，库存只够一个
        let results = run_concurrently(
            &db_path,
            vec![
                request("P1", 60.0, &[("A", 100.0)]),
                request("P2", 60.0, &[("A", 100.0)]),
            ],
        );

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        match failure {
            BlendError::InsufficientStock {
                material_name,
                required_kg,
                available_kg,
            } => {
                assert_eq!(material_name, "A");
                assert_eq!(*required_kg, 60.0);
                assert_eq!(*available_kg, 40.0);
            }
            other => panic!("Expected InsufficientStock, got {:?}", other),
        }

        let materials = MaterialRepository::new(&db_path).unwrap();
        assert_eq!(materials.find_by_name("A").unwrap().unwrap().stock_kg, 40.0);

        let records = ProductionRecordRepository::new(&db_path).unwrap();
        assert_eq!(records.list_recent(10).unwrap().len(), 1);
    }

    #[test]
    fn test_many_executions_stop_at_stock_limit() {
        let (_tmp, db_path) = create_test_db().unwrap();
        seed_materials(&db_path, &si_catalog(100.0, 100.0)).unwrap();

        // 每个请求 A/B 各 25kg，库存只够四个
        let requests = (0..6)
            .map(|i| request(&format!("P{}", i), 50.0, &[("B", 50.0), ("A", 50.0)]))
            .collect();
        let results = run_concurrently(&db_path, requests);

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 4);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, BlendError::InsufficientStock { .. })));

        let materials = MaterialRepository::new(&db_path).unwrap();
        assert_eq!(materials.find_by_name("A").unwrap().unwrap().stock_kg, 0.0);
        assert_eq!(materials.find_by_name("B").unwrap().unwrap().stock_kg, 0.0);

        let records = ProductionRecordRepository::new(&db_path).unwrap();
        assert_eq!(records.list_recent(10).unwrap().len(), 4);
    }

    #[test]
    fn test_disjoint_executions_both_succeed() {
        let (_tmp, db_path) = create_test_db().unwrap();
        seed_materials(&db_path, &si_catalog(100.0, 100.0)).unwrap();

        let results = run_concurrently(
            &db_path,
            vec![
                request("P-A", 80.0, &[("A", 100.0)]),
                request("P-B", 80.0, &[("B", 100.0)]),
            ],
        );

        assert!(results.iter().all(|r| r.is_ok()));

        let materials = MaterialRepository::new(&db_path).unwrap();
        assert_eq!(materials.find_by_name("A").unwrap().unwrap().stock_kg, 20.0);
        assert_eq!(materials.find_by_name("B").unwrap().unwrap().stock_kg, 20.0);
    }
}
