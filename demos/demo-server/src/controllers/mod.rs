pub mod default_controller;
pub mod user_controller;
