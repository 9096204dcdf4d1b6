use std::fmt::Display;
use std::time::Duration;

use crate::config::UplinkConfig;
use crate::error::FatalError;
use crate::status::is_bad_http_code;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// What came back from a connection that did open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    Response(HttpResponse),
    /// Write, submit or header read failed after the connection opened
    /// (timeouts included). Counts as a bad status.
    Interrupted(String),
}

/// True unless a 2xx status was received.
pub fn is_bad_outcome(status: Option<u16>) -> bool {
    status.map_or(true, is_bad_http_code)
}

/// One blocking HTTPS POST. An `Err` means the connection could not be
/// opened at all; anything after that is reported through [`Exchange`].
pub trait Transport {
    type Error: Display;

    fn post_json(
        &mut self,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<Exchange, Self::Error>;
}

/// Reports whether the periodic timer interrupt is still armed. Blocking
/// network calls are only allowed while it is not.
pub trait InterruptFlag {
    fn is_armed(&self) -> bool;
}

impl<F: InterruptFlag + ?Sized> InterruptFlag for &F {
    fn is_armed(&self) -> bool {
        (**self).is_armed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempts: u32,
    /// `None` when the last attempt got no status at all.
    pub last_status: Option<u16>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> bool {
        !is_bad_outcome(self.last_status)
    }
}

pub struct TelemetrySender<T, F> {
    transport: T,
    flag: F,
    endpoint_url: String,
    timeout: Duration,
}

impl<T, F> TelemetrySender<T, F>
where
    T: Transport,
    F: InterruptFlag,
{
    pub fn new(transport: T, flag: F, config: &UplinkConfig) -> Self {
        Self {
            transport,
            flag,
            endpoint_url: config.endpoint_url.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// POST `payload` once. Returns the HTTP status, or `None` if the
    /// exchange broke off before a status arrived.
    pub fn send(&mut self, payload: &str) -> Result<Option<u16>, FatalError> {
        if self.flag.is_armed() {
            log::error!("Refusing to send: timer interrupt must be disarmed before a network call");
            return Err(FatalError::TimerInterruptArmed);
        }

        log::debug!("POST {} ({} bytes)", self.endpoint_url, payload.len());
        let exchange = self
            .transport
            .post_json(&self.endpoint_url, payload, self.timeout)
            .map_err(|e| {
                log::error!("Unable to connect to {}: {}", self.endpoint_url, e);
                FatalError::Connect(e.to_string())
            })?;

        match exchange {
            Exchange::Response(response) => {
                log::info!("HTTP response code: {}", response.status);
                log::info!("Response: {}", response.body);
                Ok(Some(response.status))
            }
            Exchange::Interrupted(reason) => {
                log::warn!("Request to {} got no response: {}", self.endpoint_url, reason);
                Ok(None)
            }
        }
    }

    /// Send once, then resend while the outcome is bad and fewer than
    /// `max_attempts` sends have been made. No pause between attempts.
    pub fn send_with_retries(
        &mut self,
        payload: &str,
        max_attempts: u32,
    ) -> Result<DeliveryReport, FatalError> {
        let mut status = self.send(payload)?;
        let mut attempts = 1;

        while is_bad_outcome(status) && attempts < max_attempts {
            attempts += 1;
            log::warn!("Bad response {:?}, retrying ({}/{})", status, attempts, max_attempts);
            status = self.send(payload)?;
        }

        if is_bad_outcome(status) {
            log::warn!("Giving up after {} attempt(s), last status {:?}", attempts, status);
        }

        Ok(DeliveryReport {
            attempts,
            last_status: status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Status(u16),
        /// Connection opened, then timed out waiting for headers
        Timeout,
        /// Connection never opened
        Refused,
    }

    struct ScriptedTransport {
        script: VecDeque<Step>,
        requests: Vec<(String, String, Duration)>,
    }

    impl ScriptedTransport {
        fn new(script: &[Step]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                requests: Vec::new(),
            }
        }

        fn statuses(codes: &[u16]) -> Self {
            Self::new(&codes.iter().map(|&c| Step::Status(c)).collect::<Vec<_>>())
        }
    }

    impl Transport for ScriptedTransport {
        type Error = String;

        fn post_json(
            &mut self,
            url: &str,
            body: &str,
            timeout: Duration,
        ) -> Result<Exchange, Self::Error> {
            self.requests.push((url.to_string(), body.to_string(), timeout));
            match self.script.pop_front().unwrap_or(Step::Refused) {
                Step::Status(status) => Ok(Exchange::Response(HttpResponse {
                    status,
                    body: format!("status {status}"),
                })),
                Step::Timeout => {
                    Ok(Exchange::Interrupted("fetch headers timed out".to_string()))
                }
                Step::Refused => Err("connection refused".to_string()),
            }
        }
    }

    struct Flag(Cell<bool>);

    impl InterruptFlag for Flag {
        fn is_armed(&self) -> bool {
            self.0.get()
        }
    }

    fn disarmed() -> Flag {
        Flag(Cell::new(false))
    }

    fn sender(transport: ScriptedTransport) -> TelemetrySender<ScriptedTransport, Flag> {
        TelemetrySender::new(transport, disarmed(), &UplinkConfig::default())
    }

    fn report(attempts: u32, last_status: Option<u16>) -> DeliveryReport {
        DeliveryReport { attempts, last_status }
    }

    #[test]
    fn test_single_send_returns_status() {
        let mut sender = sender(ScriptedTransport::statuses(&[200]));

        assert_eq!(sender.send(r#"{"x":1}"#), Ok(Some(200)));

        let requests = &sender.transport().requests;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, crate::config::DEFAULT_ENDPOINT_URL);
        assert_eq!(requests[0].1, r#"{"x":1}"#);
        assert_eq!(requests[0].2, Duration::from_secs(50));
    }

    #[test]
    fn test_bad_status_is_returned_not_raised() {
        let mut sender = sender(ScriptedTransport::statuses(&[404]));
        assert_eq!(sender.send("{}"), Ok(Some(404)));
    }

    #[test]
    fn test_interrupted_exchange_is_not_fatal() {
        let mut sender = sender(ScriptedTransport::new(&[Step::Timeout]));
        assert_eq!(sender.send("{}"), Ok(None));
    }

    #[test]
    fn test_connect_failure_is_fatal() {
        let mut sender = sender(ScriptedTransport::new(&[Step::Refused]));
        assert_eq!(
            sender.send("{}"),
            Err(FatalError::Connect("connection refused".to_string()))
        );
    }

    #[test]
    fn test_armed_interrupt_blocks_network() {
        let flag = Flag(Cell::new(true));
        let mut sender = TelemetrySender::new(
            ScriptedTransport::statuses(&[200]),
            &flag,
            &UplinkConfig::default(),
        );

        assert_eq!(sender.send("{}"), Err(FatalError::TimerInterruptArmed));
        assert!(sender.transport().requests.is_empty());

        flag.0.set(false);
        assert_eq!(sender.send("{}"), Ok(Some(200)));
    }

    #[test]
    fn test_success_first_time_no_retry() {
        let mut sender = sender(ScriptedTransport::statuses(&[200, 200]));

        let result = sender.send_with_retries(r#"{"x":1}"#, 5).unwrap();
        assert_eq!(result, report(1, Some(200)));
        assert!(result.delivered());
        assert_eq!(sender.transport().requests.len(), 1);
    }

    #[test]
    fn test_retries_until_success() {
        let mut sender = sender(ScriptedTransport::statuses(&[500, 500, 500, 200]));

        let result = sender.send_with_retries("{}", 4).unwrap();
        assert_eq!(result, report(4, Some(200)));
        assert_eq!(sender.transport().requests.len(), 4);
    }

    #[test]
    fn test_exhausted_retries_are_accepted() {
        let mut sender = sender(ScriptedTransport::statuses(&[500, 500, 500, 200]));

        let result = sender.send_with_retries("{}", 3).unwrap();
        assert_eq!(result, report(3, Some(500)));
        assert!(!result.delivered());
        assert_eq!(sender.transport().requests.len(), 3);
    }

    #[test]
    fn test_zero_budget_still_sends_once() {
        let mut sender = sender(ScriptedTransport::statuses(&[503, 200]));

        let result = sender.send_with_retries("{}", 0).unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(sender.transport().requests.len(), 1);
    }

    #[test]
    fn test_timeout_after_connect_is_retried() {
        let mut sender = sender(ScriptedTransport::new(&[Step::Timeout, Step::Status(200)]));

        let result = sender.send_with_retries("{}", 3).unwrap();
        assert_eq!(result, report(2, Some(200)));
        assert!(result.delivered());
    }

    #[test]
    fn test_timeouts_until_budget_runs_out() {
        let mut sender = sender(ScriptedTransport::new(&[Step::Timeout, Step::Timeout]));

        let result = sender.send_with_retries("{}", 2).unwrap();
        assert_eq!(result, report(2, None));
        assert!(!result.delivered());
    }

    #[test]
    fn test_refused_connection_aborts_retry_loop() {
        let mut sender = sender(ScriptedTransport::new(&[
            Step::Status(502),
            Step::Refused,
            Step::Status(200),
        ]));

        assert!(matches!(
            sender.send_with_retries("{}", 5),
            Err(FatalError::Connect(_))
        ));
        assert_eq!(sender.transport().requests.len(), 2);
    }

    #[test]
    fn test_redirect_counts_as_bad() {
        let mut sender = sender(ScriptedTransport::statuses(&[301, 201]));

        let result = sender.send_with_retries("{}", 2).unwrap();
        assert_eq!(result, report(2, Some(201)));
    }

    #[test]
    fn test_missing_status_is_bad() {
        assert!(is_bad_outcome(None));
        assert!(is_bad_outcome(Some(500)));
        assert!(!is_bad_outcome(Some(204)));
    }
}
