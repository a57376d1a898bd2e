pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod host;
pub mod influence;
pub mod matcher;
pub mod record;
pub mod scene;
pub mod serializer;
pub mod session;
pub mod weights;

pub use error::{OperationReport, Result, SkinError};
pub use host::{Progress, Silent, SkinHost, SkinScene};
pub use record::SkinRecord;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
