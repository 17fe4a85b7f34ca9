//! The process-wide table of embedded boxes, keyed by box name.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{de::DecodeError, resource::LinkError, ResourceBox};

static REGISTRY: Lazy<RwLock<HashMap<String, Arc<ResourceBox>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Decoding embedded box failed")]
    Decode(#[from] DecodeError),

    #[error("Linking embedded box failed. Name: '{1}'")]
    Link(#[source] LinkError, String),

    #[error("No box registered with name '{0}'")]
    NotFound(String),
}

/// Register a linked box under its own name, replacing any previous box of that name.
pub fn register(rbox: ResourceBox) -> Arc<ResourceBox> {
    let rbox = Arc::new(rbox);
    let previous = REGISTRY
        .write()
        .insert(rbox.name.clone(), Arc::clone(&rbox));
    tracing::debug!(
        name = %rbox.name,
        replaced = previous.is_some(),
        "registered box"
    );
    rbox
}

/// Decode, link and register the bytes between a box's begin and end symbols.
pub fn register_blob(bytes: &[u8]) -> Result<Arc<ResourceBox>, RegistryError> {
    let mut rbox = crate::decode(bytes)?;
    rbox.link()
        .map_err(|e| RegistryError::Link(e, rbox.name.clone()))?;
    Ok(register(rbox))
}

pub fn find(name: &str) -> Option<Arc<ResourceBox>> {
    REGISTRY.read().get(name).cloned()
}

pub fn must_find(name: &str) -> Result<Arc<ResourceBox>, RegistryError> {
    find(name).ok_or_else(|| RegistryError::NotFound(name.to_string()))
}

/// Names of all registered boxes, sorted.
pub fn registered_names() -> Vec<String> {
    let mut names = REGISTRY.read().keys().cloned().collect::<Vec<_>>();
    names.sort();
    names
}
