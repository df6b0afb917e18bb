pub mod admin_service;
pub mod auth_service;
pub mod booking_service;
pub mod package_service;
