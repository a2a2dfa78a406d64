pub mod csv;
pub mod json;
pub mod text;

pub use csv::{convert_to_csv, write_csv};
pub use json::{JsonConfig, JsonFormatter, convert_to_json, entities_to_json, partitions_to_value};
pub use text::{TextConfig, TextFormatter, convert_to_text};
