use anyhow::Result;
use embedded_svc::http::client::Client;
use esp_idf_svc::http::client::{Configuration as HttpConfig, EspHttpConnection};
use esp_idf_svc::io::{Read, Write};
use std::time::Duration;
use uplink_core::{Exchange, HttpResponse, Transport};

// Anything past this is dropped from the logged body
const MAX_BODY_BYTES: usize = 4096;

/// HTTPS POST over the ESP-IDF client. A fresh connection is built for
/// every request.
pub struct EspTransport {
    verify_server_cert: bool,
}

impl EspTransport {
    pub fn new(verify_server_cert: bool) -> Self {
        if !verify_server_cert {
            log::warn!("Server certificate verification is DISABLED");
        }
        Self { verify_server_cert }
    }

    fn connection_config(&self, timeout: Duration) -> HttpConfig {
        HttpConfig {
            buffer_size: Some(4096),
            timeout: Some(timeout),
            crt_bundle_attach: if self.verify_server_cert {
                Some(esp_idf_sys::esp_crt_bundle_attach)
            } else {
                None
            },
            ..Default::default()
        }
    }
}

impl Transport for EspTransport {
    type Error = anyhow::Error;

    /// Errors only when the connection cannot be opened. Failures after
    /// that come back as [`Exchange::Interrupted`] so the caller can retry.
    fn post_json(&mut self, url: &str, body: &str, timeout: Duration) -> Result<Exchange> {
        let mut client = Client::wrap(EspHttpConnection::new(&self.connection_config(timeout))?);

        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];

        // Opens the TLS session
        let mut request = client.post(url, &headers)?;

        if let Err(e) = request.write_all(body.as_bytes()) {
            return Ok(Exchange::Interrupted(format!("write failed: {:?}", e)));
        }
        if let Err(e) = request.flush() {
            return Ok(Exchange::Interrupted(format!("flush failed: {:?}", e)));
        }
        let mut response = match request.submit() {
            Ok(response) => response,
            Err(e) => return Ok(Exchange::Interrupted(format!("no response: {:?}", e))),
        };
        let status = response.status();

        // The status is what matters; a broken body read only shortens the log
        let mut body = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            match response.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let room = MAX_BODY_BYTES.saturating_sub(body.len());
                    body.extend_from_slice(&buf[..n.min(room)]);
                }
                Err(e) => {
                    log::warn!("Failed to read response body: {:?}", e);
                    break;
                }
            }
        }

        Ok(Exchange::Response(HttpResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }))
    }
}
