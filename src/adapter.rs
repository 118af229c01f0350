use crate::config::NetworkConfig;
use crate::engine::SimEngine;
use crate::error::SimError;
use crate::memory::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// One request per newline-delimited JSON line.
///
/// Raw operations address the register space symbolically and carry an
/// explicit data type; tag operations speak engineering units through the
/// configured scale. This is the narrow stand-in for the real wire
/// protocols, which live outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Ping {
        #[serde(default)]
        id: u32,
    },
    Read {
        #[serde(default)]
        id: u32,
        address: String,
        data_type: DataType,
    },
    Write {
        #[serde(default)]
        id: u32,
        address: String,
        data_type: DataType,
        value: serde_json::Value,
    },
    ReadTag {
        #[serde(default)]
        id: u32,
        name: String,
    },
    WriteTag {
        #[serde(default)]
        id: u32,
        name: String,
        value: f64,
    },
}

impl Request {
    fn id(&self) -> u32 {
        match self {
            Request::Ping { id }
            | Request::Read { id, .. }
            | Request::Write { id, .. }
            | Request::ReadTag { id, .. }
            | Request::WriteTag { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Big-endian register bytes as hex, for raw reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `invalid_address` or `access_denied`, mirroring the error taxonomy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Response {
    fn ok(id: u32) -> Self {
        Self {
            id,
            ok: true,
            value: None,
            raw: None,
            error: None,
            kind: None,
        }
    }

    fn with_value(id: u32, value: serde_json::Value) -> Self {
        Self {
            value: Some(value),
            ..Self::ok(id)
        }
    }

    fn error(id: u32, error: &SimError) -> Self {
        Self {
            id,
            ok: false,
            value: None,
            raw: None,
            error: Some(error.to_string()),
            kind: Some(error.kind().to_string()),
        }
    }

    fn malformed(message: String) -> Self {
        Self {
            id: 0,
            ok: false,
            value: None,
            raw: None,
            error: Some(message),
            kind: Some("malformed_request".to_string()),
        }
    }
}

/// Execute one request against the engine. Pure with respect to the
/// transport, so protocol behavior is testable without sockets.
pub fn handle_request(engine: &SimEngine, request: &Request) -> Response {
    let id = request.id();
    let result = match request {
        Request::Ping { .. } => Ok(Response::with_value(id, serde_json::json!("pong"))),
        Request::Read {
            address, data_type, ..
        } => engine.read(address, *data_type).and_then(|raw| {
            // One store access; `value` decodes from the same bytes `raw`
            // reports, so a tick landing in between cannot split them.
            let value = data_type.decode(&raw)?;
            Ok(Response {
                raw: Some(to_hex(&raw)),
                ..Response::with_value(id, json_value(value))
            })
        }),
        Request::Write {
            address,
            data_type,
            value,
            ..
        } => value_from_json(*data_type, value)
            .and_then(|v| engine.write_value(address, *data_type, v))
            .map(|()| Response::ok(id)),
        Request::ReadTag { name, .. } => engine
            .read_tag(name)
            .map(|v| Response::with_value(id, serde_json::json!(v))),
        Request::WriteTag { name, value, .. } => {
            engine.write_tag(name, *value).map(|()| Response::ok(id))
        }
    };

    match result {
        Ok(response) => response,
        Err(e) => Response::error(id, &e),
    }
}

fn json_value(value: Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::json!(b),
        Value::U8(v) => serde_json::json!(v),
        Value::I16(v) => serde_json::json!(v),
        Value::U16(v) => serde_json::json!(v),
        Value::I32(v) => serde_json::json!(v),
        Value::U32(v) => serde_json::json!(v),
        Value::F32(v) => serde_json::json!(v),
    }
}

fn value_from_json(data_type: DataType, value: &serde_json::Value) -> Result<Value, SimError> {
    match value {
        serde_json::Value::Bool(b) => Ok(Value::from_f64(data_type, f64::from(u8::from(*b)))),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(|f| Value::from_f64(data_type, f))
            .ok_or_else(|| SimError::Syntax(n.to_string())),
        other => Err(SimError::Syntax(other.to_string())),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Bind the primary listening port, falling back to the documented
/// secondary when it is unavailable.
async fn bind_with_fallback(network: &NetworkConfig) -> std::io::Result<TcpListener> {
    let primary = format!("{}:{}", network.host, network.port);
    match TcpListener::bind(&primary).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            warn!(
                primary = %primary,
                fallback = network.fallback_port,
                error = %e,
                "primary port unavailable, trying fallback"
            );
            TcpListener::bind(format!("{}:{}", network.host, network.fallback_port)).await
        }
    }
}

/// Accept loop: one task per client, newline-delimited JSON both ways.
pub async fn serve(engine: Arc<SimEngine>, network: NetworkConfig) -> std::io::Result<()> {
    let listener = bind_with_fallback(&network).await?;
    info!(addr = %listener.local_addr()?, "adapter listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "client connected");
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, engine).await {
                debug!(%peer, error = %e, "client connection closed with error");
            }
            info!(%peer, "client disconnected");
        });
    }
}

async fn handle_client(stream: TcpStream, engine: Arc<SimEngine>) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!(?request, "adapter request");
                handle_request(&engine, &request)
            }
            Err(e) => Response::malformed(e.to_string()),
        };
        let payload = serde_json::to_string(&response)
            .unwrap_or_else(|_| r#"{"id":0,"ok":false,"error":"encode failure"}"#.to_string());
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}
