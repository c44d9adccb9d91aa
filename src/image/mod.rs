pub mod f32;
pub mod io;
pub mod stack;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::stack::Stack;
pub use self::traits::{ImageView, ImageViewMut, Rows};
