mod client;
mod config;
mod convert;

pub use client::QdrantRepository;
pub use config::QdrantConfig;
