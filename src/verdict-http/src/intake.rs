//! Multipart intake for `POST /api/predict`.

use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request};
use log::debug;
use multer::{Constraints, Field, Multipart, SizeLimit};
use verdict_serve::{UploadError, UploadedImage};

pub const IMAGE_FIELD: &str = "image";

/// Pull the single `image` file out of a multipart request. Text fields are
/// ignored; any other file field is rejected.
///
/// The MIME type is checked before the file body is read, and the size limit
/// is enforced while streaming, so neither kind of bad upload is ever
/// buffered in full.
pub async fn read_image(req: Request<Body>, limit: usize) -> Result<UploadedImage, UploadError> {
    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(UploadError::Missing)?;

    let constraints = Constraints::new().size_limit(SizeLimit::new().per_field(limit as u64));
    let mut multipart = Multipart::with_constraints(req.into_body(), boundary, constraints);

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        // Text fields ride along with the upload; only files are constrained.
        if field.file_name().is_none() {
            debug!("Skipping text field `{}`", name);
            continue;
        }
        if name != IMAGE_FIELD || image.is_some() {
            return Err(UploadError::UnexpectedField(name));
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_default();
        UploadedImage::check_content_type(&content_type)?;

        let bytes = read_field(field, limit).await?;
        debug!("Received {} byte {} upload", bytes.len(), content_type);
        image = Some(UploadedImage::new(bytes, content_type, limit)?);
    }

    image.ok_or(UploadError::Missing)
}

async fn read_field(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, UploadError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| rejection(e, limit))? {
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn rejection(err: multer::Error, limit: usize) -> UploadError {
    match err {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            UploadError::TooLarge { limit }
        }
        other => UploadError::Malformed(other.to_string()),
    }
}
