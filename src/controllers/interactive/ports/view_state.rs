use crate::core::data::render_params::{JuliaParams, RenderMode, RenderParameters};
use crate::core::data::viewport::Viewport;

/// Snapshot reads of the current view.
pub trait ViewStateProvider {
    fn viewport(&self) -> Viewport;

    fn render_params(&self) -> RenderParameters;

    fn mode(&self) -> RenderMode;

    fn julia_params(&self) -> JuliaParams;
}
