//! Core types and storage for sitegen.
//!
//! Provides the generation input model ([`site::GenerationConfig`]), the two
//! model-produced documents ([`design::DesignSystem`], [`blueprint::PageBlueprint`])
//! with their schema validation, the file model ([`files::VirtualFile`]), version
//! snapshots, runtime settings, and the on-disk version store.

pub mod blueprint;
pub mod config;
pub mod design;
pub mod files;
pub mod schema;
pub mod site;
pub mod storage;
pub mod version;
