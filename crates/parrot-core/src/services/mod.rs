//! Core services - the application's business logic layer.
//!
//! Services orchestrate between ports (trait interfaces) and domain logic.
//! They never know about concrete implementations.

mod generation;
mod material_service;
mod settings_service;

pub use generation::{
    GenerationOptions, GenerationProgress, GenerationReport, GenerationService, GenerationStage,
    VOICE_LIST_TIMEOUT, WordSource, resolve_speaker,
};
pub use material_service::MaterialService;
pub use settings_service::SettingsService;
