/// Error types for the wxnow conversion pipeline
use crate::units::{Quantity, Unit};

/// Every failure the conversion pipeline can surface to its caller.
///
/// A missing sensor value is not an error: it is encoded as a blank field.
#[derive(Debug, thiserror::Error)]
pub enum WxNowError {
    #[error("cannot convert {quantity:?} from {from} to {to}")]
    Conversion {
        quantity: Quantity,
        from: Unit,
        to: Unit,
    },

    #[error("observation has no timestamp")]
    MissingTimestamp,

    #[error("unknown unit system code {0:?}")]
    UnknownUnitSystem(Option<i64>),

    #[error("archive query failed: {0}")]
    ArchiveQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("time error: {0}")]
    Time(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WxNowError>;
