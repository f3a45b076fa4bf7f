//! Records and the protocols that keep their store entries consistent
//!
//! - `record`: in-memory entity instances
//! - `validator`: required and uniqueness checks
//! - `persist`: defaults plus save/delete batch construction
//! - `accessor`: generated `by<Field>` lookups
//! - `entity`: the `Model` handle tying a schema to a store

mod accessor;
mod entity;
mod errors;
mod persist;
mod record;
mod validator;
mod value;

pub use accessor::{lookup_many, lookup_primary, lookup_unique, Accessor, Lookup};
pub use entity::Model;
pub use errors::{ModelError, ModelResult};
pub use persist::{apply_defaults, delete_batch, save_batch};
pub use record::Record;
pub use validator::Validator;
pub use value::{is_blank, key_token};
