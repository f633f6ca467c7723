use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StoreError;
use crate::models::package::Package;
use crate::store::PackageStore;
use crate::store::records::PackageRecord;

/// In-process store keyed by tracking number.
#[derive(Default)]
pub struct MemoryStore {
    packages: DashMap<String, PackageRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageStore for MemoryStore {
    async fn fetch_package(&self, tracking_number: &str) -> Result<Package, StoreError> {
        self.packages
            .get(tracking_number)
            .map(|entry| Package::from(entry.value().clone()))
            .ok_or_else(|| StoreError::PackageNotFound(tracking_number.to_string()))
    }

    async fn list_packages(&self) -> Result<Vec<Package>, StoreError> {
        let mut packages: Vec<Package> = self
            .packages
            .iter()
            .map(|entry| Package::from(entry.value().clone()))
            .collect();
        packages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(packages)
    }

    async fn insert_package(&self, package: &Package) -> Result<(), StoreError> {
        match self.packages.entry(package.tracking_number.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(package.tracking_number.clone())),
            Entry::Vacant(slot) => {
                slot.insert(PackageRecord::from(package));
                Ok(())
            }
        }
    }

    async fn update_package(&self, package: &Package) -> Result<(), StoreError> {
        let mut record = self
            .packages
            .get_mut(&package.tracking_number)
            .ok_or_else(|| StoreError::PackageNotFound(package.tracking_number.clone()))?;

        *record = PackageRecord::from(package);
        Ok(())
    }

    async fn delete_package(&self, tracking_number: &str) -> Result<Package, StoreError> {
        self.packages
            .remove(tracking_number)
            .map(|(_, record)| Package::from(record))
            .ok_or_else(|| StoreError::PackageNotFound(tracking_number.to_string()))
    }
}
