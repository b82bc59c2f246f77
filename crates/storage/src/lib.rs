pub mod backend;
pub mod error;
mod models;
mod name;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::{ContentType, ItemInfo};
pub use crate::name::{decode as decode_name, encode as encode_name};
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
