pub mod color;
pub mod export;
pub mod grid;
pub mod pixel;
pub mod relation;
pub mod smart_pixel;
pub mod utils;
