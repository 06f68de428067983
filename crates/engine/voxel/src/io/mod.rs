// Input/Output: QBT parsing and mesh export

pub mod obj;
pub mod qbt;

pub use obj::{write_mtl, write_obj};
pub use qbt::{load_qbt, parse_qbt, QbtError};
