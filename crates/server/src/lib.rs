pub mod deployment;
pub mod error;
pub mod http;
mod middleware;
mod routes;
#[cfg(test)]
mod test_support;

pub use deployment::{DeploymentError, DeploymentImpl};
