// ABOUTME: Decoding of base64 upload payloads into content-addressed blobs
// ABOUTME: Checks size limits and image content types before anything is written

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use quadbase_core::{ComponentKind, ValidationErrors};
use sha2::{Digest, Sha256};

use crate::types::{AttachmentInput, AttachmentKind};

/// A decoded upload, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUpload {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub position: i64,
}

impl DecodedUpload {
    /// Blob key derived from the content hash, so identical files share one blob.
    pub fn storage_key(&self, component_kind: ComponentKind) -> String {
        let digest = hex::encode(Sha256::digest(&self.bytes));
        format!(
            "{}/{}/{}.{}",
            self.kind.dir(),
            component_kind.as_str(),
            digest,
            extension_for(&self.file_name, &self.content_type)
        )
    }
}

fn extension_for(file_name: &str, content_type: &str) -> String {
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext;
        }
    }
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "application/pdf" => "pdf",
        _ => "bin",
    }
    .to_string()
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Split an optional `data:<mime>;base64,` prefix from the payload.
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    if let Some(rest) = data.strip_prefix("data:") {
        if let Some((meta, body)) = rest.split_once(',') {
            let mime = meta.strip_suffix(";base64").unwrap_or(meta);
            return ((!mime.is_empty()).then_some(mime), body);
        }
    }
    (None, data)
}

/// Decode a new-upload item. `field` prefixes error keys, e.g. `images[0]`.
pub fn decode_upload(
    kind: AttachmentKind,
    input: &AttachmentInput,
    max_bytes: usize,
    field: &str,
) -> Result<DecodedUpload, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let data_field = format!("{}.data", field);

    let Some(data) = input.data.as_deref().filter(|d| !d.trim().is_empty()) else {
        errors.push(data_field, "No file was submitted.");
        return Err(errors);
    };

    let (url_mime, body) = split_data_url(data.trim());
    let bytes = match BASE64.decode(body) {
        Ok(bytes) => bytes,
        Err(_) => {
            errors.push(
                data_field,
                "The submitted data was not a valid base64-encoded file.",
            );
            return Err(errors);
        }
    };

    if bytes.is_empty() {
        errors.push(&data_field, "The submitted file is empty.");
    }
    if bytes.len() > max_bytes {
        errors.push(
            &data_field,
            format!(
                "The submitted file is too large ({} bytes, limit {} bytes).",
                bytes.len(),
                max_bytes
            ),
        );
    }

    let file_name = input
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(match kind {
            AttachmentKind::Image => "image",
            AttachmentKind::Document => "document",
        })
        .to_string();
    errors.check_max_chars(&format!("{}.file_name", field), &file_name, 255);

    let content_type = input
        .content_type
        .clone()
        .or_else(|| url_mime.map(str::to_string))
        .unwrap_or_else(|| content_type_for(&file_name).to_string());

    if kind == AttachmentKind::Image && !content_type.starts_with("image/") {
        errors.push(
            data_field,
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        );
    }

    errors.into_result()?;
    Ok(DecodedUpload {
        kind,
        file_name,
        content_type,
        bytes,
        position: input.position.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(bytes: &[u8]) -> String {
        BASE64.encode(bytes)
    }

    #[test]
    fn test_decode_plain_base64() {
        let input = AttachmentInput::upload("front.PNG", encoded(b"\x89PNG fake"));
        let upload = decode_upload(AttachmentKind::Image, &input, 1024, "images[0]").unwrap();

        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.bytes, b"\x89PNG fake");
        assert!(upload
            .storage_key(ComponentKind::Antenna)
            .starts_with("images/antenna/"));
        assert!(upload.storage_key(ComponentKind::Antenna).ends_with(".png"));
    }

    #[test]
    fn test_decode_data_url_uses_embedded_mime() {
        let input = AttachmentInput {
            data: Some(format!("data:image/webp;base64,{}", encoded(b"RIFF"))),
            ..AttachmentInput::default()
        };
        let upload = decode_upload(AttachmentKind::Image, &input, 1024, "images[0]").unwrap();
        assert_eq!(upload.content_type, "image/webp");
        assert_eq!(upload.file_name, "image");
    }

    #[test]
    fn test_document_rejected_as_image() {
        let input = AttachmentInput::upload("manual.pdf", encoded(b"%PDF-1.7"));
        let errors = decode_upload(AttachmentKind::Image, &input, 1024, "images[1]").unwrap_err();
        assert!(errors.has_field("images[1].data"));

        assert!(decode_upload(AttachmentKind::Document, &input, 1024, "documents[0]").is_ok());
    }

    #[test]
    fn test_size_limit_and_bad_base64() {
        let input = AttachmentInput::upload("big.png", encoded(&[0u8; 64]));
        assert!(decode_upload(AttachmentKind::Image, &input, 32, "images[0]").is_err());

        let garbage = AttachmentInput::upload("x.png", "not base64!!");
        assert!(decode_upload(AttachmentKind::Image, &garbage, 1024, "images[0]").is_err());

        let missing = AttachmentInput::default();
        let errors = decode_upload(AttachmentKind::Image, &missing, 1024, "images[0]").unwrap_err();
        assert_eq!(errors.messages_for("images[0].data"), vec!["No file was submitted."]);
    }

    #[test]
    fn test_identical_content_shares_key() {
        let a = decode_upload(
            AttachmentKind::Document,
            &AttachmentInput::upload("a.pdf", encoded(b"same")),
            1024,
            "documents[0]",
        )
        .unwrap();
        let b = decode_upload(
            AttachmentKind::Document,
            &AttachmentInput::upload("b.pdf", encoded(b"same")),
            1024,
            "documents[1]",
        )
        .unwrap();
        assert_eq!(
            a.storage_key(ComponentKind::Motor),
            b.storage_key(ComponentKind::Motor)
        );
    }
}
