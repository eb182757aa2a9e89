pub mod csv;
pub mod json;
pub mod weights;

pub use csv::{export_results_csv, write_results_csv};
pub use json::{read_json, write_json};
pub use weights::{
    decode_network, encode_network, load_network, read_network, save_network, write_network, FILE_VERSION,
    MAX_PARAMETERS,
};
