use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use log::{error, info};
use std::convert::Infallible;
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;
use verdict_serve::{Gateway, GatewayConfig, ProcessPredictor};

mod intake;
mod routes;

use routes::AppState;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "verdict-http",
    about = "HTTP gateway that classifies uploaded images with an external predictor"
)]
struct CmdArgs {
    #[structopt(long, env = "VERDICT_LISTEN", default_value = "127.0.0.1:5000")]
    listen: SocketAddr,

    #[structopt(long, env = "VERDICT_PREDICTOR", default_value = "python3", help = "Predictor program")]
    predictor: String,

    #[structopt(
        long = "predictor-arg",
        env = "VERDICT_PREDICTOR_ARGS",
        default_value = "predict.py",
        number_of_values = 1,
        use_delimiter = true,
        allow_hyphen_values = true,
        help = "Argument passed to the predictor before the image path (repeatable)"
    )]
    predictor_args: Vec<String>,

    #[structopt(long, env = "VERDICT_PREDICTOR_DIR", parse(from_os_str), help = "Working directory of the predictor")]
    predictor_dir: Option<PathBuf>,

    #[structopt(long, env = "VERDICT_ARTIFACT_DIR", parse(from_os_str), help = "Directory for temporary image copies")]
    artifact_dir: Option<PathBuf>,

    #[structopt(long, env = "VERDICT_MAX_UPLOAD_BYTES", default_value = "10485760")]
    max_upload_bytes: usize,

    #[structopt(long, env = "VERDICT_TIMEOUT_SECS", default_value = "120")]
    timeout_secs: u64,

    #[structopt(long, env = "VERDICT_MODEL_FILE", parse(from_os_str), default_value = "src/lib/model.h5")]
    model_file: PathBuf,
}

impl CmdArgs {
    fn gateway_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig {
            max_upload_bytes: self.max_upload_bytes,
            predictor_timeout: Duration::from_secs(self.timeout_secs),
            ..Default::default()
        };
        if let Some(dir) = &self.artifact_dir {
            config.artifact_dir = dir.clone();
        }
        config
    }

    fn predictor(&self) -> ProcessPredictor {
        let predictor = ProcessPredictor::new(&self.predictor).args(&self.predictor_args);
        match &self.predictor_dir {
            Some(dir) => predictor.current_dir(dir.clone()),
            None => predictor,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CmdArgs::from_args();

    let config = args.gateway_config();
    info!("Writing artifacts to {}", config.artifact_dir.display());
    info!("Using model from: {}", args.model_file.display());

    let state = Arc::new(AppState {
        gateway: Gateway::new(args.predictor(), &config),
        model_file: args.model_file.clone(),
    });

    let make_service = make_service_fn(move |_conn: &AddrStream| {
        let state = Arc::clone(&state);
        let service = service_fn(move |req| routes::handle(req, state.clone()));

        async move { Ok::<_, Infallible>(service) }
    });

    let server = Server::try_bind(&args.listen)?.serve(make_service);
    info!("Server running on {}", args.listen);

    let graceful = server.with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for shutdown signal: {}", e);
        }
        info!("Shutting down");
    });

    if let Err(e) = graceful.await {
        error!("server error: {}", e);
    }

    Ok(())
}
