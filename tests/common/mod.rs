//! Shared utilities for integration tests: a programmable mock backend.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use storefront_client::config::ClientConfig;

/// A request as received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// When the full request had been read.
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

/// Mock backend on an ephemeral port. Every request is recorded, then
/// answered by the handler with `(status, body)`.
pub struct MockBackend {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = (u16, String)> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    serve(socket, handler, recorded).await;
                });
            }
        });

        Self { addr, requests }
    }

    /// Answer with `responses` in order, repeating the last one.
    pub async fn sequence(responses: Vec<(u16, String)>) -> Self {
        let responses = Arc::new(responses);
        let index = Arc::new(AtomicUsize::new(0));
        Self::start(move |_| {
            let responses = responses.clone();
            let i = index.fetch_add(1, Ordering::SeqCst);
            async move { responses[i.min(responses.len() - 1)].clone() }
        })
        .await
    }

    /// Always answer with the same response.
    pub async fn fixed(status: u16, body: String) -> Self {
        Self::sequence(vec![(status, body)]).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Time between consecutive requests.
    pub fn gaps(&self) -> Vec<Duration> {
        self.requests()
            .windows(2)
            .map(|pair| pair[1].received_at.duration_since(pair[0].received_at))
            .collect()
    }
}

async fn serve<F, Fut>(
    mut socket: TcpStream,
    handler: Arc<F>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    recorded.lock().unwrap().push(request.clone());

    let (status, body) = handler(request).await;
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    let mut body = buf[header_end + 4..].to_vec();
    let header = |name: &str| {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    };

    if let Some(length) = header("content-length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < length {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body = dechunk(&body);
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
        received_at: Instant::now(),
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(line_end) = find(raw, b"\r\n") {
        let size_text = String::from_utf8_lossy(&raw[..line_end]);
        let size = usize::from_str_radix(size_text.trim(), 16).unwrap_or(0);
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        let end = (start + size).min(raw.len());
        out.extend_from_slice(&raw[start..end]);
        raw = &raw[(end + 2).min(raw.len())..];
    }
    out
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Status",
    }
}

/// `{code: 0, message, data}` success body.
pub fn ok(data: Value) -> String {
    json!({ "code": 0, "message": "ok", "data": data }).to_string()
}

/// `{code, message}` failure body.
pub fn rejected(code: i64, message: &str) -> String {
    json!({ "code": code, "message": message }).to_string()
}

/// Client configuration pointing at `url` with short retry delays.
pub fn config_for(url: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = url.to_string();
    config.api.retry_base_delay_ms = 10;
    config.api.timeout_ms = 2_000;
    config.observability.metrics_enabled = false;
    config
}

/// SKU payload with plans `(month_id, screen_id, sale_price)`, listed in both indexes.
pub fn sku_payload(type_name: &str, plans: &[(u32, u32, &str)]) -> Value {
    let plan = |m: u32, s: u32, price: &str| {
        json!({
            "month_id": m, "month": m, "month_content": format!("{m} mes"),
            "screen_id": s, "screen": s, "screen_content": format!("{s} Pantalla"),
            "max_user": s, "type_plan_id": m * 10 + s, "sort": 0,
            "currency_icon1": "S/.", "currency_icon2": "PEN(S/.)", "currency_show_type": 1,
            "original_price": price, "sale_price": price, "average_price": price, "discount": "0"
        })
    };

    let mut month_ids: Vec<u32> = plans.iter().map(|p| p.0).collect();
    month_ids.dedup();
    let mut screen_ids: Vec<u32> = plans.iter().map(|p| p.1).collect();
    screen_ids.sort_unstable();
    screen_ids.dedup();

    let months: Vec<Value> = month_ids
        .iter()
        .map(|&m| {
            let screens: Vec<Value> = plans
                .iter()
                .filter(|p| p.0 == m)
                .map(|&(m, s, price)| plan(m, s, price))
                .collect();
            json!({ "month_id": m, "month": m, "month_content": format!("{m} mes"), "screen": screens })
        })
        .collect();
    let screens: Vec<Value> = screen_ids
        .iter()
        .map(|&s| {
            let months: Vec<Value> = plans
                .iter()
                .filter(|p| p.1 == s)
                .map(|&(m, s, price)| plan(m, s, price))
                .collect();
            json!({ "screen_id": s, "screen": s, "screen_content": format!("{s} Pantalla"), "month": months })
        })
        .collect();

    let (default_month, default_screen) = plans.first().map_or((0, 0), |p| (p.0, p.1));
    json!({
        "id": 1,
        "_id": "66a1f0c2b9e4",
        "type_name": type_name,
        "thumb_img": "",
        "plan": {
            "month": months,
            "screen": screens,
            "default_month_id": default_month,
            "default_screen_id": default_screen
        }
    })
}

/// An order as returned by the backend.
pub fn order_payload(id: &str, status: &str, total: f64) -> Value {
    json!({
        "_id": id,
        "customer": "6777c28c3e73d3f1b78b467f",
        "user_id": "6777c28c3e73d3f1b78b467f",
        "out_trade_no": format!("T{id}"),
        "service_name": "Netflix",
        "plan_name": "Netflix 1 mes",
        "items": [{"productId": "netflix-1-profile", "name": "Netflix 1 mes", "quantity": 1, "price": total}],
        "total": total,
        "order_status": status,
        "paymentMethod": "yape",
        "ostatus": 0,
        "created_at": "2025-01-05T10:00:00Z",
        "updated_at": "2025-01-05T10:00:00Z"
    })
}

/// Credentials body returned by login.
pub fn credentials_payload(token: &str) -> Value {
    json!({
        "token": token,
        "refreshToken": format!("{token}-refresh"),
        "customer": { "_id": "6777c28c3e73d3f1b78b467f", "email": "test@test.com", "name": "usuario" }
    })
}
