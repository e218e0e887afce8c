//! HTTP health-check probe.

use std::time::{Duration, Instant};

use super::ProbeError;
use crate::db::{ComponentKind, Sample};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Probes a health endpoint and classifies the response.
///
/// Up means the endpoint answered 200 with a JSON body whose `ok` field is
/// truthy. Anything else, including transport errors and timeouts, is a
/// down sample.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpProbe {
    pub fn new(url: &str, token: Option<&str>) -> Result<Self, ProbeError> {
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;

        Ok(Self {
            client,
            url,
            token: token.map(str::to_string),
        })
    }

    /// Run one probe. `now` is the UTC-seconds timestamp recorded on the
    /// resulting sample.
    pub async fn probe(&self, now: i64) -> Sample {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let start = Instant::now();
        let (status, http_code, message) = match request.send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                match response.bytes().await {
                    Ok(body) => {
                        let (ok, message) = classify(code, &body);
                        (ok, code as i64, message)
                    }
                    Err(e) => (false, code as i64, e.to_string()),
                }
            }
            Err(e) => {
                let code = e.status().map(|s| s.as_u16() as i64).unwrap_or(0);
                (false, code, e.to_string())
            }
        };
        let latency_ms = start.elapsed().as_millis() as i64;

        Sample {
            kind: ComponentKind::Http,
            timestamp: now,
            status,
            latency_ms,
            http_code,
            message,
        }
    }
}

/// Classify an HTTP response into up/down plus a short diagnostic.
fn classify(code: u16, body: &[u8]) -> (bool, String) {
    let ok = code == 200 && body_ok(body);
    let message = if ok {
        "HTTP OK".to_string()
    } else {
        format!("HTTP error: {}", code)
    };
    (ok, message)
}

/// True iff the body is valid JSON with a truthy `ok` field.
fn body_ok(body: &[u8]) -> bool {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return false;
    };
    match value.get("ok") {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ok() {
        let (ok, message) = classify(200, br#"{"ok":true,"latency_ms":3}"#);
        assert!(ok);
        assert_eq!(message, "HTTP OK");
    }

    #[test]
    fn test_classify_ok_false() {
        let (ok, message) = classify(200, br#"{"ok":false}"#);
        assert!(!ok);
        assert_eq!(message, "HTTP error: 200");
    }

    #[test]
    fn test_classify_non_200() {
        let (ok, message) = classify(503, br#"{"ok":true}"#);
        assert!(!ok);
        assert_eq!(message, "HTTP error: 503");
    }

    #[test]
    fn test_classify_malformed_body() {
        let (ok, _) = classify(200, b"<html>maintenance</html>");
        assert!(!ok);
    }

    #[test]
    fn test_body_ok_truthy_variants() {
        assert!(body_ok(br#"{"ok":1}"#));
        assert!(body_ok(br#"{"ok":"yes"}"#));
        assert!(!body_ok(br#"{"ok":0}"#));
        assert!(!body_ok(br#"{"ok":""}"#));
        assert!(!body_ok(br#"{"status":"up"}"#));
    }

    #[tokio::test]
    async fn test_probe_unreachable_host_is_down_sample() {
        let probe = HttpProbe::new("http://127.0.0.1:1/health", None).unwrap();
        let sample = probe.probe(1_700_000_000).await;
        assert_eq!(sample.kind, ComponentKind::Http);
        assert!(!sample.status);
        assert_eq!(sample.http_code, 0);
        assert_eq!(sample.timestamp, 1_700_000_000);
        assert!(!sample.message.is_empty());
    }
}
