use actix_multipart::Field;
use actix_web::{error, Error};
use futures::TryStreamExt;
use rand::{distributions::Alphanumeric, Rng};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// URL prefix media files are served from.
pub const MEDIA_URL: &str = "/media/";
/// Directory under the media root that post images are written to.
pub const POST_IMAGE_DIR: &str = "posts";
/// Uploads larger than this are refused while reading.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A file received in a multipart form.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn mime(&self) -> mime::Mime {
        mime_guess::from_path(&self.filename).first_or_octet_stream()
    }
}

pub fn get_media_url(path: &str) -> String {
    format!("{}{}", MEDIA_URL, path)
}

/// Accepts only non-empty files with an image type.
pub fn validate_image(upload: &UploadedFile) -> Result<(), &'static str> {
    if upload.data.is_empty() {
        return Err("The submitted file is empty.");
    }
    if upload.mime().type_() != mime::IMAGE {
        return Err("Upload a valid image. The file you uploaded was either not an image or a corrupted image.");
    }
    Ok(())
}

/// Reads a multipart field to the end, refusing oversized bodies.
pub async fn read_field_bytes(field: &mut Field) -> Result<Vec<u8>, Error> {
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        log::error!("read_field_bytes: multipart read error: {}", e);
        error::ErrorBadRequest("Error reading upload data.")
    })? {
        if buf.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(error::ErrorPayloadTooLarge("Upload is too large."));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

pub async fn read_field_string(field: &mut Field) -> Result<String, Error> {
    let bytes = read_field_bytes(field).await?;
    String::from_utf8(bytes).map_err(|_| error::ErrorBadRequest("Form field is not valid UTF-8."))
}

/// Keeps the last path component of a client filename and only safe characters.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let clean = clean.trim_start_matches('.');
    if clean.is_empty() {
        "upload".to_owned()
    } else {
        clean.to_owned()
    }
}

/// Inserts a random suffix before the extension: `cat.png` becomes `cat_Ab3dE9x.png`.
fn with_random_suffix(filename: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", filename, suffix),
    }
}

/// Tries before giving up on finding a free name.
const NAME_ATTEMPTS: usize = 16;

/// Writes an uploaded image under the media root. An existing file is never replaced.
/// Returns the stored path relative to the media root, i.e. `posts/small.gif`.
pub fn save_post_image(media_root: &Path, upload: &UploadedFile) -> std::io::Result<String> {
    let dir = media_root.join(POST_IMAGE_DIR);
    if !dir.exists() {
        std::fs::DirBuilder::new().recursive(true).create(&dir)?;
    }

    let base = sanitize_filename(&upload.filename);
    let mut filename = base.clone();
    let mut attempts = 0;
    let mut file = loop {
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&filename))
        {
            Ok(file) => break file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempts < NAME_ATTEMPTS => {
                attempts += 1;
                filename = with_random_suffix(&base);
            }
            Err(e) => return Err(e),
        }
    };

    file.write_all(&upload.data)?;
    log::debug!("save_post_image: stored {} bytes as {}", upload.data.len(), filename);

    Ok(format!("{}/{}", POST_IMAGE_DIR, filename))
}

/// Creates the media root if missing.
pub fn init(media_root: &Path) -> std::io::Result<()> {
    if !media_root.exists() {
        std::fs::DirBuilder::new().recursive(true).create(media_root)?;
    }
    Ok(())
}
