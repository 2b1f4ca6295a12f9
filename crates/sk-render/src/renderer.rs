//! Renderer collaborator interface.
//!
//! Drawing itself lives outside this workspace. The editor only needs to
//! tell attached renderers when cached output went stale.

use sk_core::project::ImageStore;

pub trait Renderer {
    /// Drop every cached tessellation or raster.
    fn clear_cache(&mut self);

    /// Hand the renderer the image bytes it may draw, or take them away.
    fn set_image_cache(&mut self, images: Option<ImageStore>);
}
