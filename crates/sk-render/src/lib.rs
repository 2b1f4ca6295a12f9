pub mod hit;
pub mod renderer;

pub use hit::{hit_point, hit_rect, hit_shape};
pub use renderer::Renderer;
