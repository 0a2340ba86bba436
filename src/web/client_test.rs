use super::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Transport double that records requests and timeout configuration and
/// replies from a script (200 "stub" once the script runs out).
#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    timeouts: Mutex<Vec<Duration>>,
    results: Mutex<VecDeque<Result<Response, WebError>>>,
}

impl RecordingTransport {
    fn replying(status: u16, body: &[u8]) -> Self {
        Self {
            results: Mutex::new(VecDeque::from([Ok(Response { status, body: body.to_vec() })])),
            ..Self::default()
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            results: Mutex::new(VecDeque::from([Err(WebError::Transport(message.into()))])),
            ..Self::default()
        }
    }

    fn last_request(&self) -> Request {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HttpTransport for RecordingTransport {
    fn set_timeout(&self, timeout: Duration) {
        self.timeouts.lock().unwrap().push(timeout);
    }

    async fn execute(&self, request: Request) -> Result<Response, WebError> {
        self.requests.lock().unwrap().push(request);
        let next = self.results.lock().unwrap().pop_front();
        next.unwrap_or(Ok(Response { status: 200, body: b"stub".to_vec() }))
    }
}

fn client_over(transport: &Arc<RecordingTransport>) -> WebClient<Arc<RecordingTransport>> {
    WebClient::with_transport(Arc::clone(transport))
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .map(|v| v.to_str().expect("header not ascii").to_string())
}

#[tokio::test]
async fn every_method_gets_default_content_type() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport);

    client.get("http://x.test/a", Duration::ZERO, &[]).await.unwrap();
    client.put("http://x.test/a", Duration::ZERO, b"{}", &[]).await.unwrap();
    client.post("http://x.test/a", Duration::ZERO, b"{}", &[]).await.unwrap();
    client.patch("http://x.test/a", Duration::ZERO, b"{}", &[]).await.unwrap();
    client.delete("http://x.test/a", Duration::ZERO, b"{}", &[]).await.unwrap();

    let requests = transport.requests.lock().unwrap();
    let methods: Vec<&Method> = requests.iter().map(|r| &r.method).collect();
    assert_eq!(
        methods,
        [&Method::GET, &Method::PUT, &Method::POST, &Method::PATCH, &Method::DELETE]
    );
    for request in requests.iter() {
        assert_eq!(header_value(request, "content-type").as_deref(), Some("application/json"));
    }
    assert!(requests[0].body.is_none());
    for request in &requests[1..] {
        assert_eq!(request.body.as_deref(), Some(b"{}".as_slice()));
    }
}

#[tokio::test]
async fn caller_header_overrides_default_content_type() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport);

    client
        .post(
            "http://x.test/a",
            Duration::ZERO,
            b"{}",
            &[Header::new("Content-Type", "text/plain"), Header::new("X-Api-Key", "123")],
        )
        .await
        .unwrap();

    let request = transport.last_request();
    assert_eq!(header_value(&request, "content-type").as_deref(), Some("text/plain"));
    assert_eq!(header_value(&request, "x-api-key").as_deref(), Some("123"));
}

#[tokio::test]
async fn auth_header_reads_env_fresh_on_every_call() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport).token_source(TokenSource::Env("WEBWIRE_TEST_ROTATING_TOKEN".into()));

    unsafe { std::env::set_var("WEBWIRE_TEST_ROTATING_TOKEN", "first") };
    client.get_auth("http://x.test/a", Duration::ZERO, &[]).await.unwrap();
    assert_eq!(
        header_value(&transport.last_request(), "authorization").as_deref(),
        Some("Bearer first")
    );

    unsafe { std::env::set_var("WEBWIRE_TEST_ROTATING_TOKEN", "second") };
    client.get_auth("http://x.test/a", Duration::ZERO, &[]).await.unwrap();
    assert_eq!(
        header_value(&transport.last_request(), "authorization").as_deref(),
        Some("Bearer second")
    );
}

#[tokio::test]
async fn fixed_token_source_sets_bearer_header() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport).token_source(TokenSource::Value("abc123".into()));

    client.post_auth("http://x.test/a", Duration::ZERO, b"{}", &[]).await.unwrap();

    assert_eq!(
        header_value(&transport.last_request(), "authorization").as_deref(),
        Some("Bearer abc123")
    );
}

#[tokio::test]
async fn auth_pair_wins_over_caller_authorization() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport).token_source(TokenSource::Value("real".into()));

    client
        .get_auth(
            "http://x.test/a",
            Duration::ZERO,
            &[Header::new("Authorization", "Bearer forged")],
        )
        .await
        .unwrap();

    assert_eq!(
        header_value(&transport.last_request(), "authorization").as_deref(),
        Some("Bearer real")
    );
}

#[tokio::test]
async fn caller_authorization_kept_on_unauthenticated_calls() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport);

    client
        .get(
            "http://x.test/a",
            Duration::ZERO,
            &[Header::new("Authorization", "Bearer caller")],
        )
        .await
        .unwrap();

    assert_eq!(
        header_value(&transport.last_request(), "authorization").as_deref(),
        Some("Bearer caller")
    );
}

#[tokio::test]
async fn zero_timeout_skips_transport_configuration() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport);

    client.get("http://x.test/a", Duration::ZERO, &[]).await.unwrap();

    assert!(transport.timeouts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn any_nonzero_timeout_configures_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport);

    // Sub-second still counts as configured.
    client.get("http://x.test/a", Duration::from_millis(1), &[]).await.unwrap();
    client.get("http://x.test/a", Duration::from_secs(30), &[]).await.unwrap();

    let timeouts = transport.timeouts.lock().unwrap();
    assert_eq!(*timeouts, [Duration::from_millis(1), Duration::from_secs(30)]);
}

#[tokio::test]
async fn error_statuses_pass_through_unchanged() {
    let transport = Arc::new(RecordingTransport::replying(404, b"not found"));
    let client = client_over(&transport);

    let response = client.get("http://x.test/missing", Duration::ZERO, &[]).await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.body, b"not found");
}

#[tokio::test]
async fn transport_failure_surfaces_as_error() {
    let transport = Arc::new(RecordingTransport::failing("connection refused"));
    let client = client_over(&transport);

    let err = client.get("http://x.test/a", Duration::ZERO, &[]).await.unwrap_err();

    assert!(matches!(err, WebError::Transport(ref m) if m == "connection refused"));
}

#[tokio::test]
async fn malformed_url_fails_before_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport);

    let err = client.get("not a url", Duration::ZERO, &[]).await.unwrap_err();

    assert!(matches!(err, WebError::InvalidUrl(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn malformed_header_fails_before_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let client = client_over(&transport);

    let err = client
        .post(
            "http://x.test/a",
            Duration::ZERO,
            b"{}",
            &[Header::new("bad header\n", "x")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, WebError::InvalidHeader { .. }));
    assert_eq!(transport.request_count(), 0);
}
