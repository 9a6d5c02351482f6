//! Core of the image verdict gateway: persists an uploaded image, hands it to
//! an external predictor process and decodes whatever the predictor printed
//! into a [`PredictionResult`].

mod artifact;
mod config;
pub mod decode;
mod error;
mod gateway;
mod predictor;
mod result;
mod timer;
mod upload;

pub use artifact::{Artifact, ArtifactStore};
pub use config::{GatewayConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PREDICTOR_TIMEOUT};
pub use decode::decode;
pub use error::{GatewayError, UploadError};
pub use gateway::Gateway;
pub use predictor::{Predictor, PredictorOutput, ProcessPredictor};
pub use result::{Confidence, Label, PredictionResult, DEGRADED_NOTE};
pub use timer::Timer;
pub use upload::UploadedImage;
