pub mod pipeline;
pub mod relay;
pub mod render;
pub mod state;
