mod database;
mod seed;
mod state_builder;

pub use database::connect_and_migrate;
pub use seed::seed_rbac;
pub use state_builder::build_app_state;
