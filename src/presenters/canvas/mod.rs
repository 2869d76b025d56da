pub mod compositor;

pub use compositor::CanvasCompositor;
