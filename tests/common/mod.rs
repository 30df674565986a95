//! A canned-response Jenkins stand-in for driving the binary end to end.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
}

#[derive(Clone)]
pub struct Route {
    method: &'static str,
    path: String,
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

impl Route {
    pub fn get(path: &str, status: u16, body: &str) -> Self {
        Self {
            method: "GET",
            path: path.to_string(),
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn post(path: &str, status: u16) -> Self {
        Self {
            method: "POST",
            path: path.to_string(),
            status,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    /// Add a response header, e.g. `Set-Cookie`.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

pub struct MockJenkins {
    base_url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockJenkins {
    /// Serve `routes`; anything else gets a 404.
    pub fn start(routes: Vec<Route>) -> Self {
        Self::start_with_default(routes, 404)
    }

    pub fn start_with_default(routes: Vec<Route>, default_status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                serve(stream, &routes, default_status, &recorded);
            }
        });

        Self { base_url, requests }
    }

    /// Accept connections but never answer them.
    pub fn start_unresponsive() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        thread::spawn(move || {
            let mut open = Vec::new();
            for stream in listener.incoming().flatten() {
                open.push(stream);
            }
        });

        Self {
            base_url,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == "POST")
            .collect()
    }
}

fn serve(
    mut stream: TcpStream,
    routes: &[Route],
    default_status: u16,
    recorded: &Mutex<Vec<Request>>,
) {
    let Some(request) = read_request(&stream) else {
        return;
    };

    let (status, body, headers) = routes
        .iter()
        .find(|route| route.method == request.method && route.path == request.path)
        .map(|route| (route.status, route.body.clone(), route.headers.clone()))
        .unwrap_or((default_status, String::new(), Vec::new()));

    recorded.lock().unwrap().push(request);

    let extra: String = headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}\r\n"))
        .collect();
    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{extra}Connection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_request(stream: &TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|length| length.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(Request {
        method,
        path: path.to_string(),
        query: query.to_string(),
        headers,
    })
}
