//! HTTP request signing
//!
//! Implements the draft-cavage HTTP signature scheme the service expects: a
//! set of headers is joined into a signing string, signed with RSA PKCS#1 v1.5
//! over SHA-256, and carried in the `authorization` header.

use crate::streaming::error::{ServiceError, StreamError, StreamResult};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

const GENERIC_HEADERS: [&str; 3] = ["date", "(request-target)", "host"];
const BODY_HEADERS: [&str; 3] = ["content-length", "content-type", "x-content-sha256"];
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Signs requests on behalf of one API key
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Build a signer from a PEM private key (PKCS#8 or PKCS#1)
    ///
    /// The key id is `<tenancy>/<user>/<fingerprint>`.
    pub fn from_pem(
        tenancy: &str,
        user: &str,
        fingerprint: &str,
        pem: &str,
    ) -> StreamResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| StreamError::config(format!("Unable to parse API private key: {}", e)))?;

        Ok(Self::new(
            format!("{}/{}/{}", tenancy, user, fingerprint),
            private_key,
        ))
    }

    pub fn new(key_id: String, private_key: RsaPrivateKey) -> Self {
        Self {
            key_id,
            signing_key: SigningKey::<Sha256>::new(private_key),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Headers to attach to a request sent now
    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<HeaderMap, ServiceError> {
        self.sign_at(method, url, body, Utc::now())
    }

    /// Headers to attach to a request, with an explicit `date`
    pub fn sign_at(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        date: DateTime<Utc>,
    ) -> Result<HeaderMap, ServiceError> {
        let mut values: Vec<(&str, String)> = vec![
            ("date", date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
            ("(request-target)", request_target(method, url)),
            ("host", host_header(url)?),
        ];

        if let Some(body) = body {
            values.push(("content-length", body.len().to_string()));
            values.push(("content-type", JSON_CONTENT_TYPE.to_string()));
            values.push((
                "x-content-sha256",
                general_purpose::STANDARD.encode(Sha256::digest(body)),
            ));
        }

        let signing_string = values
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n");

        // PKCS#1 v1.5 is deterministic; the rng only blinds the private-key operation
        let signature = self
            .signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), signing_string.as_bytes())
            .map_err(|e| ServiceError::Signing(e.to_string()))?;

        let signed_names = if body.is_some() {
            GENERIC_HEADERS
                .iter()
                .chain(BODY_HEADERS.iter())
                .copied()
                .collect::<Vec<_>>()
        } else {
            GENERIC_HEADERS.to_vec()
        };

        let authorization = format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            signed_names.join(" "),
            general_purpose::STANDARD.encode(signature.to_bytes())
        );

        let mut headers = HeaderMap::new();
        for (name, value) in values {
            if name == "(request-target)" {
                continue;
            }
            insert_header(&mut headers, name, &value)?;
        }
        insert_header(&mut headers, "authorization", &authorization)?;
        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ServiceError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ServiceError::Signing(format!("invalid header name '{}': {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| ServiceError::Signing(format!("invalid value for '{}': {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

/// `get /20180418/streams/<id>/messages?cursor=...`
fn request_target(method: &Method, url: &Url) -> String {
    let mut target = format!("{} {}", method.as_str().to_lowercase(), url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn host_header(url: &Url) -> Result<String, ServiceError> {
    let host = url
        .host_str()
        .ok_or_else(|| ServiceError::Signing(format!("endpoint '{}' has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
