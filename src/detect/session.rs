use anyhow::{Context, Result};

use super::backend::PoseBackend;

/// A warmed-up backend with guaranteed teardown.
///
/// `close` shuts the backend down and reports errors. A session dropped without
/// `close` (early return, panic unwinding) still shuts down and logs failures.
pub struct PoseSession {
    backend: Box<dyn PoseBackend>,
    closed: bool,
}

impl PoseSession {
    pub fn start(mut backend: Box<dyn PoseBackend>) -> Result<Self> {
        backend
            .warm_up()
            .with_context(|| format!("warm up {} backend", backend.name()))?;
        log::info!("pose session started ({})", backend.name());
        Ok(Self {
            backend,
            closed: false,
        })
    }

    pub fn backend(&mut self) -> &mut dyn PoseBackend {
        self.backend.as_mut()
    }

    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.backend
            .shutdown()
            .with_context(|| format!("shut down {} backend", self.backend.name()))?;
        log::info!("pose session closed ({})", self.backend.name());
        Ok(())
    }
}

impl Drop for PoseSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.backend.shutdown() {
            log::warn!("{} backend shutdown failed: {:#}", self.backend.name(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ScriptedBackend;

    #[test]
    fn session_warms_up_and_closes() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        let session = PoseSession::start(Box::new(backend)).unwrap();
        assert!(stats.warmed_up());
        assert!(!stats.shut_down());
        session.close().unwrap();
        assert!(stats.shut_down());
    }

    #[test]
    fn dropped_session_still_shuts_down() {
        let backend = ScriptedBackend::new();
        let stats = backend.stats();
        {
            let _session = PoseSession::start(Box::new(backend)).unwrap();
        }
        assert!(stats.shut_down());
    }
}
