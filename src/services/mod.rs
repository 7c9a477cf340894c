pub mod api_client;
pub mod color;
pub mod intake;
pub mod render;
pub mod stats;
pub mod surface;
