use std::io::Read as _;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    /// Path plus query, matched exactly.
    pub url: String,
    pub status: u16,
    pub body: String,
    pub content_type: Option<&'static str>,
    /// Held before answering, to exercise client timeouts.
    pub delay: Option<Duration>,
}

impl Route {
    pub fn new(method: &'static str, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            status,
            body: body.into(),
            content_type: None,
            delay: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    #[allow(dead_code)]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub authorization: Option<String>,
}

pub struct HttpStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl HttpStub {
    pub fn spawn(routes: Vec<Route>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start http stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let method = request.method().as_str().to_owned();
                let url = request.url().to_owned();
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_owned());
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                recorded
                    .lock()
                    .expect("lock recorded requests")
                    .push(RecordedRequest {
                        method: method.clone(),
                        url: url.clone(),
                        body,
                        authorization,
                    });

                let Some(route) = routes.iter().find(|r| r.method == method && r.url == url) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                };

                if let Some(delay) = route.delay {
                    thread::sleep(delay);
                }
                let mut response =
                    tiny_http::Response::from_string(route.body.clone()).with_status_code(route.status);
                if let Some(content_type) = route.content_type {
                    let header =
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                            .expect("valid content-type header");
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock recorded requests").clone()
    }
}

impl Drop for HttpStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
