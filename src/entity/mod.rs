pub mod admins;
pub mod audit_logs;
pub mod categories;
pub mod coupons;
pub mod products;

pub use admins::Entity as Admins;
pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use coupons::Entity as Coupons;
pub use products::Entity as Products;
