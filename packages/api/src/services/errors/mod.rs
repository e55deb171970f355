pub mod auth_service_errors;
