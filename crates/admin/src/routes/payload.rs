//! Request bodies accepted in any of the encodings the clients use.
//!
//! Pages post `application/x-www-form-urlencoded` (or `multipart/form-data`
//! when a photo is attached); API clients post JSON or multipart. All three
//! are flattened into one field map and then deserialized into the draft
//! types, whose lenient fields accept strings for numbers and flags.

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use doacoes_core::ValidationErrors;

use crate::error::AppError;
use crate::services::PhotoUpload;

/// Multipart file fields taken as the photo; `item_foto` is the Portuguese name.
const PHOTO_FIELDS: [&str; 3] = ["photo", "item_photo", "item_foto"];

/// A flattened request body plus an optional uploaded photo.
#[derive(Debug, Default)]
pub struct Payload {
    fields: Map<String, Value>,
    photo: Option<PhotoUpload>,
}

fn malformed(message: impl Into<String>) -> AppError {
    AppError::Validation(ValidationErrors::non_field(message))
}

impl Payload {
    /// Deserialize the fields into `T`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the fields do not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| malformed(format!("malformed request body: {e}")))
    }

    /// The uploaded photo, if one was attached.
    pub fn take_photo(&mut self) -> Option<PhotoUpload> {
        self.photo.take()
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut payload = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| malformed(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if field.file_name().is_some() {
                if !PHOTO_FIELDS.contains(&name.as_str()) {
                    return Err(AppError::Validation(ValidationErrors::single(
                        name,
                        "file uploads are not accepted here",
                    )));
                }
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| malformed(e.body_text()))?;
                // An empty file input still submits a part, with no bytes.
                if !bytes.is_empty() {
                    if payload.photo.is_some() {
                        return Err(AppError::Validation(ValidationErrors::single(
                            name,
                            "only one photo may be uploaded",
                        )));
                    }
                    payload.photo = Some(PhotoUpload {
                        content_type,
                        file_name,
                        bytes,
                    });
                }
            } else {
                let text = field.text().await.map_err(|e| malformed(e.body_text()))?;
                payload.fields.insert(name, Value::String(text));
            }
        }

        Ok(payload)
    }
}

impl<S: Send + Sync> FromRequest<S> for Payload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| malformed(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| malformed(e.body_text()))?;
            return match value {
                Value::Object(fields) => Ok(Self {
                    fields,
                    photo: None,
                }),
                _ => Err(malformed("expected a JSON object")),
            };
        }

        let Form(form) = Form::<HashMap<String, String>>::from_request(req, state)
            .await
            .map_err(|e| malformed(e.body_text()))?;
        Ok(Self {
            fields: form
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
            photo: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use doacoes_core::ContactDraft;

    use super::*;

    async fn payload(content_type: &str, body: &'static str) -> Result<Payload, AppError> {
        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        Payload::from_request(request, &()).await
    }

    #[tokio::test]
    async fn test_json_body() {
        let p = payload("application/json", r#"{"name":"Ana","phone":11999990000}"#)
            .await
            .unwrap();
        let draft: ContactDraft = p.parse().unwrap();
        assert_eq!(draft.name.as_deref(), Some("Ana"));
        assert_eq!(draft.phone.as_deref(), Some("11999990000"));
    }

    #[tokio::test]
    async fn test_form_body() {
        let p = payload(
            "application/x-www-form-urlencoded",
            "name=Jo%C3%A3o&email=&phone=123",
        )
        .await
        .unwrap();
        let draft: ContactDraft = p.parse().unwrap();
        assert_eq!(draft.name.as_deref(), Some("João"));
        assert_eq!(draft.email, None);
    }

    #[tokio::test]
    async fn test_multipart_body_with_photo() {
        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"name\"\r\n\r\n\
            Cadeira\r\n\
            --X\r\n\
            Content-Disposition: form-data; name=\"photo\"; filename=\"c.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            PNGDATA\r\n\
            --X--\r\n";
        let mut p = payload("multipart/form-data; boundary=X", body).await.unwrap();
        let photo = p.take_photo().unwrap();
        assert_eq!(photo.content_type.as_deref(), Some("image/png"));
        assert_eq!(photo.file_name.as_deref(), Some("c.png"));
        assert_eq!(&photo.bytes[..], b"PNGDATA");
        assert_eq!(p.fields["name"], "Cadeira");
    }

    #[tokio::test]
    async fn test_multipart_rejects_other_file_fields() {
        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            PNGDATA\r\n\
            --X--\r\n";
        let err = payload("multipart/form-data; boundary=X", body)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.has("avatar")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multipart_rejects_second_photo() {
        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"photo\"; filename=\"a.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            FIRST\r\n\
            --X\r\n\
            Content-Disposition: form-data; name=\"item_foto\"; filename=\"b.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            SECOND\r\n\
            --X--\r\n";
        let err = payload("multipart/form-data; boundary=X", body)
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_must_be_object() {
        let err = payload("application/json", "[1,2]").await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
