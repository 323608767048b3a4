// ==========================================
// SQLite 库存事务存储测试
// ==========================================
// 覆盖: 提交 / 显式回滚 / 释放即回滚 / 未加锁扣减 / 库存非负约束
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod inventory_store_test {
    use alloy_blend::logging;
    use alloy_blend::domain::{ProductionRecord, Recipe, RecipeLine};
    use alloy_blend::repository::{
        InventoryStore, MaterialRepository, ProductionRecordRepository, RepositoryError,
        SqliteInventoryStore,
    };

    use crate::test_helpers::{create_test_db, seed_materials, si_catalog};

    struct Fixture {
        store: SqliteInventoryStore,
        materials: MaterialRepository,
        records: ProductionRecordRepository,
        _tmp: tempfile::NamedTempFile,
    }

    fn setup() -> Fixture {
        logging::init_test();
        let (tmp, db_path) = create_test_db().unwrap();
        seed_materials(&db_path, &si_catalog(100.0, 100.0)).unwrap();
        Fixture {
            store: SqliteInventoryStore::new(&db_path).unwrap(),
            materials: MaterialRepository::new(&db_path).unwrap(),
            records: ProductionRecordRepository::new(&db_path).unwrap(),
            _tmp: tmp,
        }
    }

    fn stock(fx: &Fixture, name: &str) -> f64 {
        fx.materials.find_by_name(name).unwrap().unwrap().stock_kg
    }

    fn sample_record() -> ProductionRecord {
        let recipe = Recipe::from_lines(vec![RecipeLine::new("A", 100.0)]);
        ProductionRecord::from_recipe("P", 10.0, &recipe, "tester")
    }

    #[test]
    fn test_commit_persists_deduction_and_record() {
        let fx = setup();
        let record = sample_record();

        let mut uow = fx.store.begin().unwrap();
        assert_eq!(uow.lock_and_read_stock("A").unwrap(), Some(100.0));
        uow.deduct_stock("A", 10.0).unwrap();
        uow.insert_production_record(&record).unwrap();
        uow.commit().unwrap();

        assert_eq!(stock(&fx, "A"), 90.0);
        let saved = fx.records.find_by_id(&record.record_id).unwrap().unwrap();
        assert_eq!(saved.usage_of("A"), Some(10.0));
    }

    #[test]
    fn test_explicit_rollback_discards_changes() {
        let fx = setup();

        let mut uow = fx.store.begin().unwrap();
        uow.lock_and_read_stock("A").unwrap();
        uow.deduct_stock("A", 10.0).unwrap();
        uow.insert_production_record(&sample_record()).unwrap();
        uow.rollback().unwrap();

        assert_eq!(stock(&fx, "A"), 100.0);
        assert_eq!(fx.records.count().unwrap(), 0);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let fx = setup();

        {
            let mut uow = fx.store.begin().unwrap();
            uow.lock_and_read_stock("B").unwrap();
            uow.deduct_stock("B", 30.0).unwrap();
        }

        assert_eq!(stock(&fx, "B"), 100.0);

        // 回滚后同一存储可以继续开启事务
        let mut uow = fx.store.begin().unwrap();
        assert_eq!(uow.lock_and_read_stock("B").unwrap(), Some(100.0));
        uow.rollback().unwrap();
    }

    #[test]
    fn test_unknown_material_reads_none() {
        let fx = setup();
        let mut uow = fx.store.begin().unwrap();
        assert_eq!(uow.lock_and_read_stock("Ghost").unwrap(), None);
        uow.rollback().unwrap();
    }

    #[test]
    fn test_deduct_requires_lock() {
        let fx = setup();
        let mut uow = fx.store.begin().unwrap();

        let result = uow.deduct_stock("A", 1.0);
        assert!(matches!(result, Err(RepositoryError::BusinessRuleViolation(_))));

        drop(uow);
        assert_eq!(stock(&fx, "A"), 100.0);
    }

    #[test]
    fn test_negative_stock_rejected_by_store() {
        let fx = setup();
        let mut uow = fx.store.begin().unwrap();
        uow.lock_and_read_stock("A").unwrap();

        let result = uow.deduct_stock("A", 150.0);
        assert!(matches!(
            result,
            Err(RepositoryError::CheckConstraintViolation(_))
        ));

        drop(uow);
        assert_eq!(stock(&fx, "A"), 100.0);
    }
}
