//! Client for the Closure Compiler web service
//!
//! The service is handed a `code_url` and fetches the source itself. Its JSON
//! reply is classified into compiled code or one of the relay's error kinds;
//! every failure path yields a distinct `RelayError` variant.

mod transport;

pub use transport::{Transport, TransportResponse, UreqTransport};

use crate::capture::{capture, TextEncoding};
use crate::config::schema::CompilerConfig;
use crate::decode::decode;
use crate::error::{RelayError, RelayResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};
use url::form_urlencoded;

/// Response fields that report problems, in priority order
const PROBLEM_FIELDS: [&str; 3] = ["errors", "serverErrors", "warnings"];

/// `output_format` sent with every request; [`interpret`] only reads JSON
pub const OUTPUT_FORMAT: &str = "json";

/// `output_info` sent with every request; [`interpret`] expects `compiledCode`
pub const OUTPUT_INFO: &str = "compiled_code";

/// Turns a source URL into minified code
#[async_trait]
pub trait Compile: Send + Sync {
    /// Compile the script at `source_url`
    async fn compile(&self, source_url: &str) -> RelayResult<String>;
}

/// Compiler backed by the Closure Compiler service
pub struct ClosureCompiler {
    transport: Arc<dyn Transport>,
    settings: CompilerConfig,
}

impl ClosureCompiler {
    /// Create a compiler using the default HTTP transport
    pub fn new(settings: CompilerConfig) -> Self {
        Self::with_transport(settings, Arc::new(UreqTransport::new()))
    }

    /// Create a compiler with an explicit transport
    pub fn with_transport(settings: CompilerConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Form body for one compile request
    pub fn request_body(&self, source_url: &str) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("code_url", source_url)
            .append_pair("compilation_level", &self.settings.compilation_level)
            .append_pair("output_format", OUTPUT_FORMAT)
            .append_pair("output_info", OUTPUT_INFO)
            .finish()
    }
}

#[async_trait]
impl Compile for ClosureCompiler {
    async fn compile(&self, source_url: &str) -> RelayResult<String> {
        let body = self.request_body(source_url);
        let endpoint = self.settings.endpoint.clone();
        let transport = Arc::clone(&self.transport);

        debug!("Compiling {} via {}", source_url, endpoint);

        tokio::task::spawn_blocking(move || {
            let response = transport.post_form(&endpoint, &body)?;
            read_response(response)
        })
        .await
        .map_err(|e| RelayError::Internal(format!("compile task failed: {}", e)))?
    }
}

/// Classify a raw compile service response.
///
/// The body is decoded with the charset the service declares, UTF-8 if none.
pub fn read_response(response: TransportResponse) -> RelayResult<String> {
    if response.status != 200 {
        return Err(RelayError::UnexpectedStatus(response.status));
    }

    let encoding: TextEncoding = match response.charset.as_deref() {
        Some(name) => name.parse()?,
        None => TextEncoding::default(),
    };
    trace!("Reading compile response as {}", encoding);

    let text = capture(response.body, encoding)?;
    let document = decode(&text)?;
    interpret(document)
}

/// Pull compiled code out of a decoded response document
pub fn interpret(document: Value) -> RelayResult<String> {
    let Value::Object(mut fields) = document else {
        return Err(RelayError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    for name in PROBLEM_FIELDS {
        if let Some(problems) = fields.get(name).filter(|v| is_reported(v)) {
            return Err(RelayError::Compilation {
                field: name.to_string(),
                detail: problems.to_string(),
            });
        }
    }

    match fields.remove("compiledCode") {
        Some(Value::String(code)) => Ok(code),
        Some(other) => Err(RelayError::MalformedResponse(format!(
            "compiledCode is not a string: {}",
            other
        ))),
        None => Err(RelayError::MalformedResponse(
            "missing compiledCode".to_string(),
        )),
    }
}

fn is_reported(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
