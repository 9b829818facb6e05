//! Storefront rules that do not touch the database or HTTP.

pub mod cart;
pub mod catalog;
pub mod order_status;
pub mod scheduling;
