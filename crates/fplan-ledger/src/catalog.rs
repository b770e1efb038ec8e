//! 記憶體主檔

use fplan_core::{
    CatalogRepository, Client, Machine, Mold, PlanError, Piece, Result, Supplier,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// 記憶體主檔（依ID排序）
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    machines: RwLock<BTreeMap<String, Machine>>,
    molds: RwLock<BTreeMap<String, Mold>>,
    pieces: RwLock<BTreeMap<String, Piece>>,
    clients: RwLock<BTreeMap<String, Client>>,
    suppliers: RwLock<BTreeMap<String, Supplier>>,
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(PlanError::MissingField("id"));
    }
    Ok(())
}

impl InMemoryCatalog {
    /// 創建空主檔
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_machine(&self, machine: Machine) -> Result<()> {
        require_id(&machine.id)?;
        self.machines.write().insert(machine.id.clone(), machine);
        Ok(())
    }

    pub fn upsert_mold(&self, mold: Mold) -> Result<()> {
        require_id(&mold.id)?;
        if mold.cavities == 0 {
            return Err(PlanError::Validation(format!("模具 {} 穴數不可為零", mold.id)));
        }
        self.molds.write().insert(mold.id.clone(), mold);
        Ok(())
    }

    /// 新增或更新物料（庫存初始化由呼叫端負責）
    pub fn upsert_piece(&self, piece: Piece) -> Result<()> {
        require_id(&piece.id)?;
        if piece.stock_min > piece.stock_max {
            return Err(PlanError::Validation(format!(
                "物料 {} 最小庫存 {} 大於最大庫存 {}",
                piece.id, piece.stock_min, piece.stock_max
            )));
        }
        self.pieces.write().insert(piece.id.clone(), piece);
        Ok(())
    }

    pub fn contains_piece(&self, id: &str) -> bool {
        self.pieces.read().contains_key(id)
    }

    pub fn upsert_client(&self, client: Client) -> Result<()> {
        require_id(&client.id)?;
        self.clients.write().insert(client.id.clone(), client);
        Ok(())
    }

    pub fn upsert_supplier(&self, supplier: Supplier) -> Result<()> {
        require_id(&supplier.id)?;
        self.suppliers.write().insert(supplier.id.clone(), supplier);
        Ok(())
    }

    pub fn client(&self, id: &str) -> Result<Client> {
        self.clients
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PlanError::not_found("客戶", id))
    }

    pub fn supplier(&self, id: &str) -> Result<Supplier> {
        self.suppliers
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PlanError::not_found("供應商", id))
    }

    /// 某客戶的物料
    pub fn pieces_of_client(&self, client_id: &str) -> Vec<Piece> {
        self.pieces
            .read()
            .values()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect()
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn machine(&self, id: &str) -> Result<Machine> {
        self.machines
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PlanError::not_found("機台", id))
    }

    fn mold(&self, id: &str) -> Result<Mold> {
        self.molds
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PlanError::not_found("模具", id))
    }

    fn piece(&self, id: &str) -> Result<Piece> {
        self.pieces
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PlanError::not_found("物料", id))
    }

    fn machines(&self) -> Vec<Machine> {
        self.machines.read().values().cloned().collect()
    }

    fn molds(&self) -> Vec<Mold> {
        self.molds.read().values().cloned().collect()
    }

    fn pieces(&self) -> Vec<Piece> {
        self.pieces.read().values().cloned().collect()
    }
}
