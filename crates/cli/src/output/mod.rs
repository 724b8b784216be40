mod format;

pub use format::{print_info, print_json, print_success, OutputMode};
