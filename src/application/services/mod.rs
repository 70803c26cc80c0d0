pub mod config_validator;
pub mod online_validator;
