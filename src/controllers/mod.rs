pub mod generation;
pub mod interactive;
pub mod pool;
