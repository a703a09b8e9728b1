pub mod approaches;
pub mod compare;
pub mod inventory;
pub mod metrics;
pub mod validate;
