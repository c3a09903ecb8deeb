pub mod camera;
pub mod composition;
pub mod detection;
pub mod game;
pub mod pipeline;
pub mod presentation;
pub mod settings;
pub mod shared;
