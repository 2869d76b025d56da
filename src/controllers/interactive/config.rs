use std::num::NonZeroU32;

use crate::controllers::pool::config::PoolConfig;
use crate::core::data::render_pass::{CANONICAL_PASSES, RenderPass};
use crate::core::util::tile_scheduler::DEFAULT_TILE_SIZE;

#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub tile_size: NonZeroU32,
    pub pool: PoolConfig,
    pub passes: Vec<RenderPass>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            pool: PoolConfig::default(),
            passes: CANONICAL_PASSES.to_vec(),
        }
    }
}
