pub mod kudos;
pub mod kudos_config;
