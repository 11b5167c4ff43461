pub mod error;
pub mod locks;
pub mod office_hour_service;
pub mod registration_service;
