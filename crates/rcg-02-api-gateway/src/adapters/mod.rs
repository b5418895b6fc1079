//! Router inventory adapters.

pub mod file_inventory;
pub mod memory_inventory;

pub use file_inventory::FileInventory;
pub use memory_inventory::MemoryInventory;
