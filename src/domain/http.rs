/// Status and protocol of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSummary {
    pub url: String,
    pub status: u16,
    pub reason: Option<String>,
    pub proto: String,
}

impl HttpSummary {
    pub fn new(url: String, status: u16, reason: Option<String>, proto: String) -> Self {
        Self { url, status, reason, proto }
    }

    pub fn status_line(&self) -> String {
        match &self.reason {
            Some(r) => format!("{} {}", self.status, r),
            None => self.status.to_string(),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }
}
