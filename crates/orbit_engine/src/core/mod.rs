//! # Core Module
//!
//! Configuration shared by applications built on the engine.

pub mod config;

pub use config::{
    AnimationConfig,
    AssetConfig,
    BindingConfig,
    CameraConfig,
    Config,
    ConfigError,
    UniformBinding,
    ViewerConfig,
};
