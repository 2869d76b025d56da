pub mod colour;
pub mod complex;
pub mod generation;
pub mod pixel_buffer;
pub mod render_params;
pub mod render_pass;
pub mod tile;
pub mod viewport;
