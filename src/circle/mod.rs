mod client;
mod jobs;
mod pipelines;
pub mod types;
mod workflows;

pub use client::CircleClient;
pub use jobs::ProjectCoords;
