pub mod appointments;
pub mod audit_logs;
pub mod carts;
pub mod categories;
pub mod products;
pub mod users;

pub use appointments::Entity as Appointments;
pub use audit_logs::Entity as AuditLogs;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use products::Entity as Products;
pub use users::Entity as Users;
