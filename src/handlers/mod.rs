// Handlers module

pub mod clear_files;
pub mod home;
pub mod stream;

pub use clear_files::clear_files_handler;
pub use home::home_handler;
pub use stream::{stream_json_handler, stream_multipart_handler, stream_query_handler};
