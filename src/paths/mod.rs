pub mod path;
pub mod resolver;

pub use path::{os_path_to_string, page_key, AnchorPath, PAGE_EXTENSION};
pub use resolver::LinkResolver;
