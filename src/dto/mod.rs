pub mod appointments;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod users;
