pub mod render;
pub mod viewport;

pub use render::Highlights;
pub use viewport::Viewport;
