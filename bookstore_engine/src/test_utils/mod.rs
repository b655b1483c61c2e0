pub mod prepare_env;
pub mod test_gateway;

pub use prepare_env::{prepare_test_env, random_db_path};
pub use test_gateway::TestGateway;
