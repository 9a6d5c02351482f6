use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use structopt::StructOpt;
use verdict_serve::{Gateway, GatewayConfig, ProcessPredictor, UploadedImage};

extern crate serde_json;

use log::info;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "verdict-classify",
    about = "CLI app to classify a local image with an external predictor"
)]
struct CmdArgs {
    #[structopt(help = "Predictor program to run")]
    predictor: String,

    #[structopt(parse(from_os_str), help = "Path to the image to classify")]
    image: PathBuf,

    #[structopt(
        short = "a",
        long = "arg",
        number_of_values = 1,
        allow_hyphen_values = true,
        help = "Argument passed to the predictor before the image path (repeatable)"
    )]
    args: Vec<String>,

    #[structopt(long, default_value = "120", help = "Seconds before the predictor is killed")]
    timeout_secs: u64,

    #[structopt(long, parse(from_os_str), help = "Directory for the temporary image copy")]
    artifact_dir: Option<PathBuf>,
}

/// Content type of a local file, guessed from its extension.
fn content_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") | None => "image/jpeg".to_owned(),
        Some(other) => format!("image/{}", other),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CmdArgs::from_args();

    let mut config = GatewayConfig {
        predictor_timeout: Duration::from_secs(args.timeout_secs),
        ..Default::default()
    };
    if let Some(dir) = &args.artifact_dir {
        config.artifact_dir = dir.clone();
    }

    let bytes = tokio::fs::read(&args.image).await?;
    let image = UploadedImage::new(bytes, content_type_for(&args.image), config.max_upload_bytes)?;

    let gateway = Gateway::new(ProcessPredictor::new(&args.predictor).args(&args.args), &config);
    let result = gateway.predict(&image).await?;

    info!("Classified {}", args.image.display());
    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}
