pub mod cancellation;
pub mod render_surface;
pub mod render_tile;
