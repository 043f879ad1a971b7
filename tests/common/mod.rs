//! Minimal HTTP/1.1 stub standing in for the INE API in offline tests.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Answer every request whose target contains a route's path with that route's
    /// status and body; anything else gets a 404. Runs until the test process exits.
    pub fn start(routes: Vec<(&'static str, u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Ok(read_half) = stream.try_clone() else { continue };
                let mut reader = BufReader::new(read_half);

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                loop {
                    let mut header = String::new();
                    match reader.read_line(&mut header) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if header.trim().is_empty() => break,
                        Ok(_) => {}
                    }
                }

                let target = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();
                seen.lock().unwrap().push(target.clone());

                let (status, body) = routes
                    .iter()
                    .find(|(path, _, _)| target.contains(path))
                    .map(|(_, status, body)| (*status, *body))
                    .unwrap_or((404, "{}"));
                let reason = if status == 200 { "OK" } else { "Error" };
                let resp = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes());
                let _ = stream.flush();
            }
        });

        Self {
            base_url: format!("http://{}/ES", addr),
            requests,
        }
    }

    /// Request targets (path + query) received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// A base URL nothing is listening on.
pub fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/ES", addr)
}

pub const OPERATIONS_JSON: &str = r#"[
  {"Id": 25, "Cod_IOE": "30138", "Nombre": "Índice de Precios de Consumo (IPC)", "Codigo": "IPC"},
  {"Id": 22, "Cod_IOE": "30180", "Nombre": "Encuesta de Población Activa (EPA)", "Codigo": "EPA"}
]"#;

pub const TABLES_JSON: &str = r#"[
  {"Id": 50902, "Nombre": "Índices nacionales: general y de grupos ECOICOP", "Codigo": "", "FK_Periodicidad": 1, "FK_Publicacion": 8, "FK_Periodo_Ini": 1, "Anyo_Periodo_Ini": "2002", "FechaRef_fin": null, "Ultima_Modificacion": 1705014000000}
]"#;

pub const TABLE_DATA_JSON: &str = r#"[
  {"Nombre": "S1", "COD": "C1", "Data": [
    {"Fecha": 0, "Valor": "10"},
    {"Fecha": 86400000, "Valor": "bad"}
  ]}
]"#;
