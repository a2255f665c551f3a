//! Lane-keyed session registry.

use std::collections::HashMap;
use std::sync::Arc;

use muse_common::{LaneId, ModelVariant};
use tracing::{debug, info};

use crate::{AiError, GenerativeBackend};

use super::manager::Session;
use super::types::SessionSpec;

/// Owns the active session of every lane.
///
/// `open` reuses a lane's session while its model and instruction are
/// unchanged; `refresh` always replaces it. Prior turns are never carried
/// into a replacement session.
pub struct SessionRegistry {
    backend: Arc<dyn GenerativeBackend>,
    default_instruction: String,
    sessions: HashMap<LaneId, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn GenerativeBackend>, default_instruction: impl Into<String>) -> Self {
        Self {
            backend,
            default_instruction: default_instruction.into(),
            sessions: HashMap::new(),
        }
    }

    pub fn default_instruction(&self) -> &str {
        &self.default_instruction
    }

    /// Return the lane's session for `(model, instruction)`, creating it if
    /// the lane has none or has one bound to something else.
    pub fn open(
        &mut self,
        lane: &LaneId,
        model: ModelVariant,
        system_instruction: Option<&str>,
    ) -> Result<Arc<Session>, AiError> {
        let spec = self.spec_for(model, system_instruction);
        if let Some(existing) = self.sessions.get(lane) {
            if *existing.spec() == spec {
                return Ok(Arc::clone(existing));
            }
            debug!(lane = %lane, "Session spec changed, replacing session");
        }
        self.create(lane, spec)
    }

    /// Replace the lane's session unconditionally. The previous handle stays
    /// valid for any exchange still holding it but is no longer handed out.
    pub fn refresh(
        &mut self,
        lane: &LaneId,
        model: ModelVariant,
        system_instruction: Option<&str>,
    ) -> Result<Arc<Session>, AiError> {
        let spec = self.spec_for(model, system_instruction);
        self.create(lane, spec)
    }

    /// Current session of a lane, without creating one.
    pub fn get(&self, lane: &LaneId) -> Option<Arc<Session>> {
        self.sessions.get(lane).cloned()
    }

    /// Drop the lane's session. Returns the removed handle, if any.
    pub fn close(&mut self, lane: &LaneId) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(lane);
        if removed.is_some() {
            info!(lane = %lane, "Session closed");
        }
        removed
    }

    pub fn lanes(&self) -> impl Iterator<Item = &LaneId> {
        self.sessions.keys()
    }

    fn spec_for(&self, model: ModelVariant, system_instruction: Option<&str>) -> SessionSpec {
        let instruction = system_instruction
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.default_instruction.as_str());
        SessionSpec::new(model, instruction)
    }

    fn create(&mut self, lane: &LaneId, spec: SessionSpec) -> Result<Arc<Session>, AiError> {
        self.backend.establish_session(&spec)?;
        let session = Arc::new(Session::new(spec));
        info!(lane = %lane, session = %session.id(), model = %session.model(), "Session created");
        self.sessions.insert(lane.clone(), Arc::clone(&session));
        Ok(session)
    }
}
