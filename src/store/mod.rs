pub mod memory;
pub mod records;

use crate::error::StoreError;
use crate::models::package::Package;

pub use memory::MemoryStore;

/// Persistence port for package aggregates.
///
/// Writes are whole-aggregate: the checkpoint list travels with its package,
/// so a package and its checkpoints are always stored together.
pub trait PackageStore: Send + Sync {
    fn fetch_package(
        &self,
        tracking_number: &str,
    ) -> impl Future<Output = Result<Package, StoreError>> + Send;

    fn list_packages(&self) -> impl Future<Output = Result<Vec<Package>, StoreError>> + Send;

    /// Fails with `Duplicate` if the tracking number is taken.
    fn insert_package(
        &self,
        package: &Package,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fails with `PackageNotFound` if the tracking number is unknown.
    fn update_package(
        &self,
        package: &Package,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes the package together with its checkpoints and images.
    fn delete_package(
        &self,
        tracking_number: &str,
    ) -> impl Future<Output = Result<Package, StoreError>> + Send;
}
