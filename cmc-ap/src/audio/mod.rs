//! Audio subsystem: backend trait, two-phase context, synth and outputs

pub mod context;
pub mod log_backend;
#[cfg(feature = "cpal")]
pub mod output;
pub mod synth;
pub mod types;

pub use context::{AudioContext, ContextState};
pub use log_backend::LogBackend;
#[cfg(feature = "cpal")]
pub use output::CpalBackend;
pub use types::{db_to_gain, NoteTrigger, SoundBackend};

use std::sync::Arc;

use crate::config::AudioBackendKind;
use crate::error::Result;

/// Construct the configured sound backend
pub fn backend_for(kind: AudioBackendKind) -> Result<Arc<dyn SoundBackend>> {
    match kind {
        AudioBackendKind::Log => Ok(Arc::new(LogBackend::new())),
        #[cfg(feature = "cpal")]
        AudioBackendKind::Cpal => Ok(Arc::new(CpalBackend::new())),
        #[cfg(not(feature = "cpal"))]
        AudioBackendKind::Cpal => Err(crate::error::Error::Config(
            "cpal backend requested but cmc-ap was built without the `cpal` feature".to_string(),
        )),
    }
}
