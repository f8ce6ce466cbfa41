pub mod batch_loader;

pub use batch_loader::{load_batch_file, parse_batch_lines, SourceLine};
