use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};

use crate::artifact::ArtifactStore;
use crate::config::GatewayConfig;
use crate::decode::decode;
use crate::error::GatewayError;
use crate::predictor::Predictor;
use crate::result::PredictionResult;
use crate::timer::Timer;
use crate::upload::UploadedImage;

/// Runs one accepted image through persist, invoke, release and decode.
#[derive(Clone)]
pub struct Gateway {
    predictor: Arc<dyn Predictor>,
    store: ArtifactStore,
    max_upload_bytes: usize,
    timeout: Duration,
}

impl Gateway {
    pub fn new<P: Predictor + 'static>(predictor: P, config: &GatewayConfig) -> Self {
        Gateway {
            predictor: Arc::new(predictor),
            store: ArtifactStore::new(config.artifact_dir.clone()),
            max_upload_bytes: config.max_upload_bytes,
            timeout: config.predictor_timeout,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Classify `image`.
    ///
    /// Only infrastructure failures are errors; undecodable predictor output
    /// yields [`PredictionResult::degraded`]. The artifact is gone by the time
    /// this returns, and also if the returned future is dropped early.
    pub async fn predict(&self, image: &UploadedImage) -> Result<PredictionResult, GatewayError> {
        let t = Timer::start("Persisting artifact");
        let artifact = self.store.persist(image.bytes(), &image.extension())?;
        t.finish();

        let t = Timer::start("Running predictor");
        let output = tokio::time::timeout(self.timeout, self.predictor.invoke(artifact.path())).await;
        let ran_for = t.finish();

        artifact.release();

        let output = match output {
            Ok(output) => output?,
            Err(_) => return Err(GatewayError::Timeout(self.timeout)),
        };

        if !output.success() {
            error!("Predictor exited with code {:?}", output.exit_code);
            error!("Predictor stderr: {}", output.stderr.trim_end());
            return Err(GatewayError::Exit {
                code: output.exit_code,
            });
        }

        debug!("Raw predictor output: {}", output.stdout.trim());
        let result = decode(&output.stdout);
        info!(
            "Predicted {:?} ({}) in {} msec",
            result.prediction,
            result.confidence.as_f64(),
            ran_for.num_milliseconds()
        );
        Ok(result)
    }
}
