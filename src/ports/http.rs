use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use crate::domain::{HttpSummary, HopstatError, ParsedUrl};
use super::ConnectionObserver;

pub struct HopRequest {
    pub url: ParsedUrl,
}

pub struct HttpResponse {
    pub summary: HttpSummary,
    pub location: Option<String>,
    pub body: UnsyncBoxBody<Bytes, HopstatError>,
}

impl HttpResponse {
    /// Reads the body to the end, returning the number of bytes seen.
    pub async fn drain(&mut self) -> Result<u64, HopstatError> {
        let mut read = 0u64;
        while let Some(frame) = self.body.frame().await {
            if let Some(chunk) = frame?.data_ref() {
                read += chunk.len() as u64;
            }
        }
        Ok(read)
    }

    /// Location of the next hop, if this response should be followed.
    pub fn redirect_location(&self) -> Option<&str> {
        if self.summary.is_redirect() { self.location.as_deref() } else { None }
    }
}

/// Performs one request/response exchange, reporting lifecycle events as it goes.
pub trait HttpTransport: Send + Sync {
    fn round_trip(&self, request: &HopRequest, observer: &mut (dyn ConnectionObserver + Send))
        -> impl std::future::Future<Output = Result<HttpResponse, HopstatError>> + Send;
}
