use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, info, trace};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::GatewayError;

/// Everything a finished predictor run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictorOutput {
    pub stdout: String,
    pub stderr: String,

    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl PredictorOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that classifies the image stored at a path.
///
/// Implementations must stop any work they started when the returned future
/// is dropped before completion.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn invoke(&self, image: &Path) -> Result<PredictorOutput, GatewayError>;
}

/// Runs an external program once per image, appending the image path after
/// the configured arguments: `<program> [args...] <image>`.
#[derive(Debug, Clone)]
pub struct ProcessPredictor {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ProcessPredictor {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        ProcessPredictor {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Working directory of the spawned predictor.
    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn command_line(&self, image: &Path) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .chain(std::iter::once(image.as_os_str()))
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Predictor for ProcessPredictor {
    async fn invoke(&self, image: &Path) -> Result<PredictorOutput, GatewayError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        info!("Running predictor: {}", self.command_line(image));
        let mut child = command.spawn().map_err(|source| GatewayError::Spawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stderr not captured"))?;

        let (stdout, stderr, status) = tokio::try_join!(
            collect(stdout, "stdout"),
            collect(stderr, "stderr"),
            child.wait()
        )?;
        debug!("Predictor finished with {}", status);

        Ok(PredictorOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: status.code(),
        })
    }
}

/// Read a child stream to its end, chunk by chunk as the predictor emits it.
async fn collect<R: AsyncRead + Unpin>(mut reader: R, stream: &str) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(buf);
        }

        let text = String::from_utf8_lossy(&chunk[..n]);
        if stream == "stderr" {
            debug!("Predictor stderr: {}", text.trim_end());
        } else {
            trace!("Predictor {}: {}", stream, text.trim_end());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> ProcessPredictor {
        ProcessPredictor::new("sh").args(&["-c", script, "sh"])
    }

    #[tokio::test]
    async fn image_path_is_the_last_argument() {
        let out = shell("printf '%s' \"$1\"")
            .invoke(Path::new("/tmp/some image.png"))
            .await
            .unwrap();

        assert!(out.success());
        assert_eq!(out.stdout, "/tmp/some image.png");
    }

    #[tokio::test]
    async fn collects_output_written_in_pieces() {
        let out = shell("printf '{\"prediction\":'; sleep 0.1; printf '\"REAL\"}'; echo oops >&2")
            .invoke(Path::new("ignored"))
            .await
            .unwrap();

        assert_eq!(out.stdout, "{\"prediction\":\"REAL\"}");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn reports_exit_code() {
        let out = shell("echo failing >&2; exit 3")
            .invoke(Path::new("ignored"))
            .await
            .unwrap();

        assert!(!out.success());
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stderr, "failing\n");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = ProcessPredictor::new("/definitely/not/a/predictor")
            .invoke(Path::new("ignored"))
            .await
            .unwrap_err();

        match err {
            GatewayError::Spawn { program, .. } => {
                assert_eq!(program, "/definitely/not/a/predictor")
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn runs_in_configured_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out = shell("pwd")
            .current_dir(tmp.path())
            .invoke(Path::new("ignored"))
            .await
            .unwrap();

        assert_eq!(
            Path::new(out.stdout.trim()).canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn command_line_lists_program_args_and_image() {
        let predictor = ProcessPredictor::new("python3").arg("predict.py");
        assert_eq!(
            predictor.command_line(Path::new("/tmp/a.png")),
            "python3 predict.py /tmp/a.png"
        );
    }
}
