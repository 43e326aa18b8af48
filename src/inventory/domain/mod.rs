pub mod inventory_sink;
pub mod inventory_source;
