pub mod html;
pub mod image;
