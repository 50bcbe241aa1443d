//! Mock reconciliation API server for testing
//!
//! A tiny HTTP server on a random loopback port that answers the endpoints
//! the client uses, with a fixed reconciliation (id 42 by default):
//!
//! - GET    /api/conciliaciones/{id}
//! - POST   /api/conciliaciones/{id}/conciliar-manual
//! - POST   /api/conciliaciones/{id}/procesar
//! - POST   /api/conciliaciones/{id}/terminar_conciliacion
//! - DELETE /api/conciliaciones/{id}/eliminar
//! - GET    /api/conciliaciones/{id}/matches_y_manuales
//! - DELETE /api/conciliaciones/match/{match_id}/eliminar
//!
//! Every request is recorded so tests can assert on paths and bodies.
//! Bearer tokens starting with `valid_` are accepted.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

/// Mock server handle; stops on drop
pub struct MockReconciliationServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for the mock's behaviour
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// The only reconciliation id that exists
    pub reconciliation_id: i64,
    /// Answer 401 to everything
    pub fail_auth: bool,
    /// Status and body for `conciliar-manual` (default 200 with a message)
    pub manual_response: Option<(u16, String)>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            reconciliation_id: 42,
            fail_auth: false,
            manual_response: None,
            delay_ms: 0,
        }
    }
}

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

impl MockReconciliationServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        // Non-blocking accept so the loop can notice shutdown
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let log = requests_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &log));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests matching `method` and `path`
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockReconciliationServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one full HTTP request (headers plus `Content-Length` body)
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];

    loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    Some(String::from_utf8_lossy(&data).into_owned())
}

fn handle_connection(
    mut stream: TcpStream,
    config: &MockConfig,
    log: &Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let _ = stream.set_nonblocking(false);
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let (head, body) = request
        .split_once("\r\n\r\n")
        .unwrap_or((request.as_str(), ""));
    let first_line = head.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"detail": "Invalid request"}"#);
        return;
    }

    let method = parts[0].to_string();
    let path = parts[1].split('?').next().unwrap_or(parts[1]).to_string();
    let authorization = head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("authorization")
            .then(|| value.trim().to_string())
    });

    if let Ok(mut requests) = log.lock() {
        requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            authorization: authorization.clone(),
            body: body.to_string(),
        });
    }

    let has_valid_auth = authorization
        .as_deref()
        .map_or(false, |a| a.to_lowercase().starts_with("bearer valid_"));
    if config.fail_auth || !has_valid_auth {
        send_response(&mut stream, 401, "Unauthorized", r#"{"detail": "Not authenticated"}"#);
        return;
    }

    let (status, body) = route(config, &method, &path);
    send_response(&mut stream, status, status_text(status), &body);
}

fn route(config: &MockConfig, method: &str, path: &str) -> (u16, String) {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        ("DELETE", ["api", "conciliaciones", "match", match_id, "eliminar"]) => {
            if *match_id == "5" {
                ok(json!({"message": format!("Match #{} eliminado con éxito.", match_id)}))
            } else {
                (404, json!({"detail": "Match no encontrado"}).to_string())
            }
        }
        (_, ["api", "conciliaciones", id, rest @ ..]) => {
            if id.parse::<i64>().ok() != Some(config.reconciliation_id) {
                return (404, json!({"detail": "Conciliación no encontrada"}).to_string());
            }
            match (method, rest) {
                ("GET", []) => ok(mock_detail(config.reconciliation_id)),
                ("POST", ["conciliar-manual"]) => match &config.manual_response {
                    Some((status, body)) => (*status, body.clone()),
                    None => ok(json!({
                        "message": "Conciliación manual realizada con éxito.",
                        "resultado": {"success": true}
                    })),
                },
                ("POST", ["procesar"]) => ok(json!({
                    "message": format!("Conciliación #{} procesada automáticamente.", id)
                })),
                ("POST", ["terminar_conciliacion"]) => ok(json!({
                    "message": format!("Conciliación #{} marcada como finalizada.", id)
                })),
                ("DELETE", ["eliminar"]) => ok(json!({
                    "message": format!("Conciliación #{} eliminada.", id)
                })),
                ("GET", ["matches_y_manuales"]) => ok(mock_matches()),
                _ => (404, json!({"detail": "Not Found"}).to_string()),
            }
        }
        _ => (404, json!({"detail": "Not Found"}).to_string()),
    }
}

fn ok(value: serde_json::Value) -> (u16, String) {
    (200, value.to_string())
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn mock_movement(id: i64, tipo: &str, es: &str, valor: f64, descripcion: &str) -> serde_json::Value {
    json!({
        "id": id,
        "id_conciliacion": 42,
        "fecha": "2024-03-05",
        "descripcion": descripcion,
        "valor": valor,
        "es": es,
        "tipo": tipo,
        "estado_conciliacion": "no_conciliado"
    })
}

/// Bank 1, 2 (E) and 3 (S); ledger 10 (E) and 11 (S)
fn mock_detail(reconciliation_id: i64) -> serde_json::Value {
    json!({
        "stats": {
            "porcentaje_conciliacion": 28.57,
            "conciliados": 2,
            "pendientes": 5,
            "total_movimientos": 7
        },
        "conciliacion": {
            "id": reconciliation_id,
            "id_empresa": 1,
            "fecha_proceso": "2024-04-02",
            "estado": "en_proceso",
            "mes_conciliado": "Marzo",
            "cuenta_conciliada": "110505",
            "año_conciliado": "2024"
        },
        "movimientos_no_conciliados": {
            "banco": [
                mock_movement(1, "banco", "E", 100.0, "Consignación cliente A"),
                mock_movement(2, "banco", "E", 50.5, "Consignación cliente B"),
                mock_movement(3, "banco", "S", 30.0, "Comisión bancaria")
            ],
            "auxiliar": [
                mock_movement(10, "auxiliar", "E", 150.5, "Recaudo facturas"),
                mock_movement(11, "auxiliar", "S", 30.0, "Gasto bancario")
            ]
        },
        "movimientos_conciliados": [
            {
                "id": 5,
                "id_movimiento_banco": 4,
                "id_movimiento_auxiliar": 12,
                "fecha_match": "2024-04-02",
                "criterio_match": "exacto",
                "diferencia_valor": 0.0
            }
        ]
    })
}

fn mock_matches() -> serde_json::Value {
    json!({
        "matches": [
            {
                "id": 5,
                "movimiento_banco": mock_movement(4, "banco", "S", 80.0, "Pago proveedor"),
                "movimiento_auxiliar": mock_movement(12, "auxiliar", "S", 80.0, "Pago proveedor"),
                "diferencia": 0.0,
                "criterio_match": "exacto",
                "fecha": "2024-04-02"
            }
        ],
        "conciliaciones_manuales": [
            {
                "id_conciliacion_manual": 1,
                "fecha_creacion": "2024-04-03T10:00:00",
                "movimientos_banco": [mock_movement(6, "banco", "E", 20.0, "Abono")],
                "movimientos_auxiliar": [mock_movement(14, "auxiliar", "E", 20.0, "Abono")]
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_server_starts() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        assert!(server.port() > 0);
        assert!(server.requests().is_empty());
    }

    #[test]
    fn test_route_unknown_reconciliation() {
        let (status, body) = route(&MockConfig::default(), "GET", "/api/conciliaciones/1");
        assert_eq!(status, 404);
        assert!(body.contains("no encontrada"));
    }

    #[test]
    fn test_route_custom_manual_response() {
        let config = MockConfig {
            manual_response: Some((400, r#"{"detail":"ids ya conciliados"}"#.to_string())),
            ..Default::default()
        };
        let (status, body) = route(&config, "POST", "/api/conciliaciones/42/conciliar-manual");
        assert_eq!(status, 400);
        assert!(body.contains("ids ya conciliados"));
    }
}
