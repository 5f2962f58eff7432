//! HTTP implementation of [`StreamClient`]

use crate::streaming::client::StreamClient;
use crate::streaming::error::{ServiceError, StreamError, StreamResult};
use crate::streaming::model::{
    CreateCursorDetails, CreateGroupCursorDetails, Cursor, CursorResponse, PollResult,
    PutMessagesDetails, PutMessagesResult, StreamMessage,
};
use crate::streaming::signer::RequestSigner;
use async_trait::async_trait;
use reqwest::{Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "20180418";
const NEXT_CURSOR_HEADER: &str = "opc-next-cursor";
const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Streaming service client speaking JSON over HTTPS
#[derive(Debug, Clone)]
pub struct HttpStreamClient {
    http: reqwest::Client,
    endpoint: Url,
    signer: RequestSigner,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpStreamClient {
    /// Create a client for a messages endpoint such as
    /// `https://cell-1.streaming.us-phoenix-1.oci.oraclecloud.com`
    pub fn new(endpoint: &str, signer: RequestSigner) -> StreamResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            StreamError::config(format!("Invalid service endpoint '{}': {}", endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() || endpoint.host_str().is_none() {
            return Err(StreamError::config(format!(
                "Invalid service endpoint '{}': expected an http(s) URL with a host",
                endpoint
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("streamtick/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StreamError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            signer,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn stream_url(&self, stream_id: &str, resource: &str) -> Result<Url, ServiceError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::InvalidRequest(format!("endpoint '{}' cannot be a base", self.endpoint))
            })?
            .pop_if_empty()
            .extend([API_VERSION, "streams", stream_id, resource]);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Response, ServiceError> {
        let headers = self.signer.sign(&method, &url, body.as_deref())?;

        log::trace!("{} {}", method, url.path());
        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|e| ServiceError::InvalidRequest(format!("failed to serialise body: {}", e)))?;
        let response = self.send(Method::POST, url, Some(payload)).await?;
        decode_json(response).await
    }
}

async fn api_error(response: Response) -> ServiceError {
    let status = response.status();
    let opc_request_id = header_string(&response, REQUEST_ID_HEADER);
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ApiErrorBody>(&body).ok();

    ServiceError::Api {
        status: status.as_u16(),
        code: parsed
            .as_ref()
            .and_then(|b| b.code.clone())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string()),
        message: parsed.and_then(|b| b.message).unwrap_or(body),
        opc_request_id,
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
}

fn header_string(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl StreamClient for HttpStreamClient {
    async fn create_cursor(
        &self,
        stream_id: &str,
        details: &CreateCursorDetails,
    ) -> Result<Cursor, ServiceError> {
        let url = self.stream_url(stream_id, "cursors")?;
        let cursor: CursorResponse = self.post_json(url, details).await?;
        Ok(cursor.value)
    }

    async fn create_group_cursor(
        &self,
        stream_id: &str,
        details: &CreateGroupCursorDetails,
    ) -> Result<Cursor, ServiceError> {
        let url = self.stream_url(stream_id, "groupCursors")?;
        let cursor: CursorResponse = self.post_json(url, details).await?;
        Ok(cursor.value)
    }

    async fn get_messages(
        &self,
        stream_id: &str,
        cursor: &Cursor,
        limit: Option<u32>,
    ) -> Result<PollResult, ServiceError> {
        let mut url = self.stream_url(stream_id, "messages")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("cursor", cursor.as_str());
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }

        let response = self.send(Method::GET, url, None).await?;
        let next_cursor = header_string(&response, NEXT_CURSOR_HEADER)
            .map(Cursor::new)
            .ok_or_else(|| {
                ServiceError::MalformedResponse(format!(
                    "GetMessages response has no '{}' header",
                    NEXT_CURSOR_HEADER
                ))
            })?;
        let messages: Vec<StreamMessage> = decode_json(response).await?;

        Ok(PollResult {
            messages,
            next_cursor,
        })
    }

    async fn put_messages(
        &self,
        stream_id: &str,
        details: &PutMessagesDetails,
    ) -> Result<PutMessagesResult, ServiceError> {
        let url = self.stream_url(stream_id, "messages")?;
        let result: PutMessagesResult = self.post_json(url, details).await?;

        if result.entries.len() != details.messages.len() {
            return Err(ServiceError::MalformedResponse(format!(
                "PutMessages returned {} entries for {} messages",
                result.entries.len(),
                details.messages.len()
            )));
        }
        Ok(result)
    }
}
