pub mod annotator;
pub mod decode;
