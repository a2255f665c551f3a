pub mod errors;
pub mod id;
pub mod model;

pub use errors::{ConfigError, MuseError};
pub use id::{new_id, LaneId, MessageId, MessageIdGen, SessionId};
pub use model::ModelVariant;

pub type Result<T> = std::result::Result<T, MuseError>;
