pub mod escape_time;
pub mod kernel;
pub mod orbit_traps;
pub mod palettes;
