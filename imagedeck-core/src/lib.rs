pub mod collection;
pub mod config;
pub mod errors;
pub mod kv;
pub mod models;
pub mod repo;
pub mod retry;
pub mod routes;
pub mod store;

pub use collection::*;
pub use config::*;
pub use errors::*;
pub use kv::*;
pub use models::*;
pub use repo::*;
pub use retry::*;
pub use routes::*;
pub use store::*;
