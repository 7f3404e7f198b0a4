pub mod errors;
pub mod models;
pub mod parser;
pub mod reference;
pub mod services;
pub mod sizing;
pub mod store;

pub use errors::*;
pub use models::*;
pub use services::*;
pub use sizing::*;
pub use store::*;
