//! Request body decoding shared by the project and post handlers.
//!
//! Bodies arrive either as `multipart/form-data` or as JSON. Both are folded
//! into one JSON object and deserialized into the handler's input type, with
//! the `image` field split off as an [`ImageSource`].

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::media::{ImageSource, ImageUpload};

const IMAGE_FIELD: &str = "image";

/// Tags as a JSON list or one comma-delimited string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl TagsInput {
    /// Trimmed, non-empty tags in input order.
    pub fn normalize(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            TagsInput::List(items) => items,
            TagsInput::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Accepts `"2024"` or `2024` for free-text fields a JSON client may send as numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Loose>::deserialize(deserializer)?.map(|v| match v {
        Loose::Text(s) => s,
        Loose::Int(n) => n.to_string(),
        Loose::Float(n) => n.to_string(),
    }))
}

/// Trims a present value; blank becomes `None`.
pub fn clean(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Decoded content body: typed fields plus the optional image.
#[derive(Debug)]
pub struct ContentForm<T> {
    pub fields: T,
    pub image: Option<ImageSource>,
}

impl<S, T> FromRequest<S> for ContentForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let (mut object, upload) = if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            read_multipart(multipart).await?
        } else {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            match value {
                Value::Object(map) => (map, None),
                _ => {
                    return Err(ApiError::Validation(
                        "Request body must be a JSON object".to_string(),
                    ))
                }
            }
        };

        let image_url = match object.remove(IMAGE_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(url)) => Some(ImageSource::Url(url)),
            Some(_) => {
                return Err(ApiError::Validation(
                    "image must be a URL string or a file".to_string(),
                ))
            }
        };

        let fields = serde_json::from_value(Value::Object(object))
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;

        // An uploaded file wins over a URL sent alongside it.
        let image = upload.map(ImageSource::Upload).or(image_url);

        Ok(ContentForm { fields, image })
    }
}

/// A part holding a JSON array of strings is taken as that list, so `[]`
/// clears and `["Node, Express"]` stays one element. Anything else is text.
fn text_part_value(text: String) -> Value {
    if text.trim_start().starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(&text) {
            return Value::Array(items.into_iter().map(Value::String).collect());
        }
    }
    Value::String(text)
}

/// Text parts become string values (repeated names become a list); the
/// `image` file part is returned separately.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Map<String, Value>, Option<ImageUpload>), ApiError> {
    let mut object = Map::new();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            // Browsers send an empty, unnamed part for an untouched file input.
            if name != IMAGE_FIELD || (bytes.is_empty() && filename.is_empty()) {
                continue;
            }
            upload = Some(ImageUpload {
                bytes: bytes.to_vec(),
                filename: (!filename.is_empty()).then_some(filename),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        let value = text_part_value(text);
        match object.get_mut(&name) {
            Some(Value::Array(items)) => match value {
                Value::Array(more) => items.extend(more),
                single => items.push(single),
            },
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(name, value);
            }
        }
    }

    Ok((object, upload))
}
