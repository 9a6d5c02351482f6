use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

/// Measures one stage of a request and logs how long it took once finished.
pub struct Timer {
    stage: String,
    started: DateTime<Utc>,
}

impl Timer {
    pub fn start<S: Into<String>>(stage: S) -> Self {
        let stage = stage.into();
        debug!("{}: starting", stage);

        Timer {
            stage,
            started: Utc::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        Utc::now() - self.started
    }

    pub fn finish(self) -> Duration {
        let d = self.elapsed();
        info!("{} took {} msec", self.stage, d.num_milliseconds());
        d
    }
}
