// ==========================================
// 合金配料系统 - 内存库存事务存储
// ==========================================
// 锁粒度: 每个原料一个库存槽（Mutex + Condvar），持有者为事务ID
// 可见性: 扣减先记在事务内，提交时在 commit_gate 写锁下一次性生效
// 用途: 单进程部署、测试
// ==========================================

use crate::domain::material::Material;
use crate::domain::production::ProductionRecord;
use crate::repository::catalog::{InventoryStore, MaterialCatalog, StockUnitOfWork};
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};

struct SlotState {
    stock_kg: f64,
    holder: Option<u64>,
}

struct StockSlot {
    state: Mutex<SlotState>,
    released: Condvar,
}

impl StockSlot {
    fn new(stock_kg: f64) -> Self {
        Self {
            state: Mutex::new(SlotState {
                stock_kg,
                holder: None,
            }),
            released: Condvar::new(),
        }
    }

    /// 释放持有，并可选地应用扣减
    fn release(&self, txn_id: u64, deduction: f64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.holder == Some(txn_id) {
            state.stock_kg -= deduction;
            state.holder = None;
        }
        drop(state);
        self.released.notify_all();
    }
}

// ==========================================
// InMemoryInventoryStore
// ==========================================
pub struct InMemoryInventoryStore {
    materials: RwLock<BTreeMap<String, Material>>,
    slots: RwLock<HashMap<String, Arc<StockSlot>>>,
    records: Mutex<Vec<ProductionRecord>>,
    commit_gate: RwLock<()>,
    next_txn_id: AtomicU64,
}

impl Default for InMemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self {
            materials: RwLock::new(BTreeMap::new()),
            slots: RwLock::new(HashMap::new()),
            records: Mutex::new(Vec::new()),
            commit_gate: RwLock::new(()),
            next_txn_id: AtomicU64::new(1),
        }
    }

    /// 以原料列表初始化
    pub fn with_materials(materials: Vec<Material>) -> RepositoryResult<Self> {
        let store = Self::new();
        for material in materials {
            store.insert_material(material)?;
        }
        Ok(store)
    }

    /// 登记原料（名称重复时报唯一约束错误）
    pub fn insert_material(&self, material: Material) -> RepositoryResult<()> {
        if material.stock_kg < 0.0 || !material.stock_kg.is_finite() {
            return Err(RepositoryError::FieldValueError {
                field: "stock_kg".to_string(),
                message: format!("库存不能为负: {}", material.stock_kg),
            });
        }

        let mut materials = self
            .materials
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        if materials.contains_key(&material.name) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "material.name={}",
                material.name
            )));
        }

        let mut slots = self
            .slots
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        slots.insert(material.name.clone(), Arc::new(StockSlot::new(material.stock_kg)));
        materials.insert(material.name.clone(), material);
        Ok(())
    }

    /// 已提交的库存
    pub fn stock_of(&self, material_name: &str) -> RepositoryResult<Option<f64>> {
        let _gate = self
            .commit_gate
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        match self.slot(material_name)? {
            Some(slot) => {
                let state = slot
                    .state
                    .lock()
                    .map_err(|e| RepositoryError::LockError(e.to_string()))?;
                Ok(Some(state.stock_kg))
            }
            None => Ok(None),
        }
    }

    /// 已提交的生产记录
    pub fn production_records(&self) -> RepositoryResult<Vec<ProductionRecord>> {
        let _gate = self
            .commit_gate
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let records = self
            .records
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(records.clone())
    }

    fn slot(&self, material_name: &str) -> RepositoryResult<Option<Arc<StockSlot>>> {
        let slots = self
            .slots
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(slots.get(material_name).cloned())
    }
}

impl MaterialCatalog for InMemoryInventoryStore {
    fn list_eligible_materials(&self) -> RepositoryResult<Vec<Material>> {
        let _gate = self
            .commit_gate
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let materials = self
            .materials
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut eligible = Vec::new();
        for material in materials.values() {
            let stock_kg = match self.slot(&material.name)? {
                Some(slot) => {
                    let state = slot
                        .state
                        .lock()
                        .map_err(|e| RepositoryError::LockError(e.to_string()))?;
                    state.stock_kg
                }
                None => continue,
            };
            if stock_kg > 0.0 {
                let mut snapshot = material.clone();
                snapshot.stock_kg = stock_kg;
                eligible.push(snapshot);
            }
        }
        Ok(eligible)
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn begin(&self) -> RepositoryResult<Box<dyn StockUnitOfWork + '_>> {
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(InMemoryUnitOfWork {
            store: self,
            txn_id,
            held: Vec::new(),
            deductions: HashMap::new(),
            pending_records: Vec::new(),
            finished: false,
        }))
    }
}

// ==========================================
// InMemoryUnitOfWork
// ==========================================
struct HeldSlot {
    material_name: String,
    slot: Arc<StockSlot>,
    stock_at_lock: f64,
}

struct InMemoryUnitOfWork<'a> {
    store: &'a InMemoryInventoryStore,
    txn_id: u64,
    held: Vec<HeldSlot>,
    deductions: HashMap<String, f64>,
    pending_records: Vec<ProductionRecord>,
    finished: bool,
}

impl InMemoryUnitOfWork<'_> {
    fn held(&self, material_name: &str) -> Option<&HeldSlot> {
        self.held.iter().find(|h| h.material_name == material_name)
    }

    fn pending_deduction(&self, material_name: &str) -> f64 {
        self.deductions.get(material_name).copied().unwrap_or(0.0)
    }

    fn release_all(&mut self, apply: bool) {
        for held in self.held.drain(..) {
            let deduction = if apply {
                self.deductions.get(&held.material_name).copied().unwrap_or(0.0)
            } else {
                0.0
            };
            held.slot.release(self.txn_id, deduction);
        }
    }
}

impl StockUnitOfWork for InMemoryUnitOfWork<'_> {
    fn lock_and_read_stock(&mut self, material_name: &str) -> RepositoryResult<Option<f64>> {
        if let Some(held) = self.held(material_name) {
            return Ok(Some(held.stock_at_lock - self.pending_deduction(material_name)));
        }

        let slot = match self.store.slot(material_name)? {
            Some(slot) => slot,
            None => return Ok(None),
        };

        let stock_at_lock = {
            let mut state = slot
                .state
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            while state.holder.is_some() {
                state = slot
                    .released
                    .wait(state)
                    .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            }
            state.holder = Some(self.txn_id);
            state.stock_kg
        };

        self.held.push(HeldSlot {
            material_name: material_name.to_string(),
            slot,
            stock_at_lock,
        });
        Ok(Some(stock_at_lock))
    }

    fn deduct_stock(&mut self, material_name: &str, amount_kg: f64) -> RepositoryResult<()> {
        let stock_at_lock = match self.held(material_name) {
            Some(held) => held.stock_at_lock,
            None => {
                return Err(RepositoryError::BusinessRuleViolation(format!(
                    "扣减前未加锁: {}",
                    material_name
                )))
            }
        };

        let after = stock_at_lock - self.pending_deduction(material_name) - amount_kg;
        if after < 0.0 {
            return Err(RepositoryError::CheckConstraintViolation(format!(
                "stock_kg >= 0 ({}: {})",
                material_name, after
            )));
        }

        *self.deductions.entry(material_name.to_string()).or_insert(0.0) += amount_kg;
        Ok(())
    }

    fn insert_production_record(&mut self, record: &ProductionRecord) -> RepositoryResult<()> {
        self.pending_records.push(record.clone());
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> RepositoryResult<()> {
        let store = self.store;
        let _gate = store
            .commit_gate
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let mut records = store
            .records
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        records.append(&mut self.pending_records);
        self.release_all(true);
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> RepositoryResult<()> {
        self.release_all(false);
        self.finished = true;
        Ok(())
    }
}

impl Drop for InMemoryUnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.release_all(false);
        }
    }
}
