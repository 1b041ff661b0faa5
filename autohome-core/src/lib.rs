pub mod adapters;
pub mod configs;
pub mod errors;
pub mod home;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod services;

pub use errors::{DispatchError, Error};
pub use home::{AutoHome, Collaborators, action_names};
