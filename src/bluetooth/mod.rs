pub mod scanner;

pub use scanner::{decode_ruuvi_data, scan_for_ruuvitag};
