//! # HTTP Transport
//!
//! The seam between the client core and the network. Everything above this
//! module builds [`ApiRequest`] values; only a [`HttpTransport`] implementation
//! talks to the outside world.
//!
//! - **FetchTransport**: `wasm32` builds, backed by `worker::Fetch`
//! - Test doubles implement the trait directly

use async_trait::async_trait;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::multipart::MultipartForm;

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-2xx response into `AppError::Api`.
    pub fn error_for_status(self) -> AppResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AppError::from_response(self.status, &self.body))
        }
    }

    /// Decodes the body; an empty body (e.g. 204) decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends one request and returns the raw response.
///
/// Implementations report only transport-level failures as errors;
/// HTTP error statuses come back as ordinary responses.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse>;
}

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchTransport;

#[cfg(target_arch = "wasm32")]
mod fetch {
    use super::*;
    use crate::constants::HEADER_CONTENT_TYPE;
    use crate::multipart::Part;
    use web_sys::{Blob, BlobPropertyBag, FormData};
    use worker::js_sys::{Array, Uint8Array};
    use worker::wasm_bindgen::JsValue;
    use worker::{Fetch, Headers, Request, RequestInit};

    /// Transport backed by the global `fetch`.
    #[derive(Clone, Debug, Default)]
    pub struct FetchTransport;

    fn to_worker_method(method: &Method) -> AppResult<worker::Method> {
        Ok(match *method {
            Method::GET => worker::Method::Get,
            Method::POST => worker::Method::Post,
            Method::PUT => worker::Method::Put,
            Method::PATCH => worker::Method::Patch,
            Method::DELETE => worker::Method::Delete,
            Method::HEAD => worker::Method::Head,
            Method::OPTIONS => worker::Method::Options,
            ref other => {
                return Err(AppError::Transport(format!("Unsupported method {}", other)))
            }
        })
    }

    fn js_error(err: JsValue) -> AppError {
        AppError::Transport(format!("{:?}", err))
    }

    /// Browser `FormData` with every part in order; files keep their name and type.
    fn form_data(form: &MultipartForm) -> AppResult<FormData> {
        let data = FormData::new().map_err(js_error)?;
        for part in form.parts() {
            match part {
                Part::Text { name, value } => {
                    data.append_with_str(name, value).map_err(js_error)?;
                }
                Part::File { name, file } => {
                    let chunks = Array::of1(&Uint8Array::from(file.bytes()));
                    let options = BlobPropertyBag::new();
                    options.set_type(file.mime_type());
                    let blob = Blob::new_with_u8_array_sequence_and_options(&chunks, &options)
                        .map_err(js_error)?;
                    data.append_with_blob_and_filename(name, &blob, file.name())
                        .map_err(js_error)?;
                }
            }
        }
        Ok(data)
    }

    #[async_trait(?Send)]
    impl HttpTransport for FetchTransport {
        async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
            let headers = Headers::new();
            for (name, value) in &request.headers {
                headers.set(name, value)?;
            }

            let body = match &request.body {
                RequestBody::Empty => None,
                RequestBody::Json(value) => {
                    headers.set(HEADER_CONTENT_TYPE, "application/json")?;
                    Some(JsValue::from_str(&serde_json::to_string(value)?))
                }
                // fetch sets the multipart Content-Type and boundary itself.
                RequestBody::Multipart(form) => Some(form_data(form)?.into()),
            };

            let mut init = RequestInit::new();
            init.with_method(to_worker_method(&request.method)?)
                .with_headers(headers)
                .with_body(body);

            let outgoing = Request::new_with_init(&request.url, &init)?;
            let mut response = Fetch::Request(outgoing)
                .send()
                .await
                .map_err(|e| AppError::Transport(e.to_string()))?;

            let status = response.status_code();
            let body = response.bytes().await?;
            Ok(ApiResponse { status, body })
        }
    }
}
