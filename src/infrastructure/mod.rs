pub mod in_memory;
pub mod overpass;
pub mod paystack;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod static_position;
