//! Role suppliers

mod static_supplier;

pub use static_supplier::StaticRoleSupplier;
