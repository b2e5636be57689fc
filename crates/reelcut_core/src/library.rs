use crate::types::*;
use uuid::Uuid;

/// The asset pool: everything imported or generated this session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPool {
    assets: Vec<Asset>,
}

impl AssetPool {
    pub fn new() -> Self {
        Self { assets: vec![] }
    }

    pub fn add(&mut self, asset: Asset) -> Uuid {
        let id = asset.id;
        tracing::debug!(asset = %id, kind = %asset.kind, "Asset added to library");
        self.assets.push(asset);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Asset> {
        let pos = self.assets.iter().position(|a| a.id == id)?;
        Some(self.assets.remove(pos))
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Remember a duration resolved at drop time so later drops skip probing.
    pub fn record_duration(&mut self, id: Uuid, duration: TimeUs) {
        if let Some(asset) = self.assets.iter_mut().find(|a| a.id == id) {
            asset.duration = Some(duration);
        }
    }
}
