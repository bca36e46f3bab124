pub mod default_service;

pub use default_service::DefaultService;
