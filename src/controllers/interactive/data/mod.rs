pub mod frame_data;
pub mod gpu_params;
