pub mod tile_scheduler;
