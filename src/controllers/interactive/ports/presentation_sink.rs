use crate::controllers::interactive::data::frame_data::{FullFrame, TileFrame};
use crate::controllers::interactive::errors::renderer::RendererError;
use crate::core::data::generation::Generation;
use crate::core::data::render_pass::PassKind;

/// Where rendered pixels go.
///
/// Frames arrive from the render thread, many times per second and with
/// tiles in any order. Every call except `failed` is made while the
/// generation it carries is current; implementations must not start or
/// cancel renders from inside these callbacks.
pub trait PresentationSink: Send + Sync {
    /// A new generation started; drop whatever is on screen.
    fn clear(&self, generation: Generation);

    fn present(&self, frame: TileFrame);

    fn present_full(&self, frame: FullFrame);

    fn pass_completed(&self, _generation: Generation, _pass: PassKind) {}

    fn failed(&self, _generation: Generation, _error: &RendererError) {}
}
