pub mod fertilizer_file;
pub mod image_store;
pub mod retention;
