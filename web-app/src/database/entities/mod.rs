pub mod migration;
pub mod registration;
