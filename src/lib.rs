pub mod bluetooth;
pub mod config;
pub mod database;
pub mod encoder;
pub mod error;
pub mod models;
pub mod rain;
pub mod record;
pub mod sink;
pub mod units;
pub mod zone;

pub use error::{Result, WxNowError};
pub use models::{Observation, Record};
pub use rain::Archive;
pub use record::{assemble, emit, StatusLine};
pub use units::{Quantity, Unit, UnitSystem};
pub use zone::LocalZone;
