//! MCP tool servers: course content and web search.
//!
//! Each [`McpServer`] is one streamable-HTTP connection made through the
//! rmcp SDK. Its tools are listed once at connect time and registered into
//! the session [`Toolbox`]; calls are forwarded over the protocol and every
//! failure comes back to the model as text, so a turn never aborts on a tool.

use anyhow::{Result, anyhow};
use compact_str::CompactString;
use llm::Tool;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, RawContent},
    service::{Peer, RoleClient, RunningService},
    transport::StreamableHttpClientTransport,
};
use router::Toolbox;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

/// A connected MCP server and the tools it offers.
pub struct McpServer {
    name: CompactString,
    peer: Peer<RoleClient>,
    tools: Vec<Tool>,
    timeout: Duration,
    /// Keeps the connection alive; dropping it closes the session.
    _service: Mutex<RunningService<RoleClient, ()>>,
}

impl McpServer {
    /// Connect over streamable HTTP and list the server's tools.
    ///
    /// Tries `attempts` times; each handshake and tool listing, as well as
    /// every later call, is bounded by `timeout`.
    pub async fn connect(name: &str, url: &str, timeout: Duration, attempts: u32) -> Result<Self> {
        let mut last = anyhow!("{name}: no connection attempts");
        for attempt in 1..=attempts.max(1) {
            match Self::connect_once(name, url, timeout).await {
                Ok(server) => return Ok(server),
                Err(e) => {
                    tracing::debug!("{name}: connect attempt {attempt} failed: {e}");
                    last = e;
                }
            }
        }
        Err(last)
    }

    async fn connect_once(name: &str, url: &str, timeout: Duration) -> Result<Self> {
        let transport = StreamableHttpClientTransport::from_uri(url);
        let service: RunningService<RoleClient, ()> =
            tokio::time::timeout(timeout, ().serve(transport))
                .await
                .map_err(|_| anyhow!("{name}: handshake timed out"))??;
        let listed = tokio::time::timeout(timeout, service.list_all_tools())
            .await
            .map_err(|_| anyhow!("{name}: tools/list timed out"))??;

        let tools: Vec<Tool> = listed.iter().map(convert_tool).collect();
        tracing::info!("{name}: connected with {} tools", tools.len());
        Ok(Self {
            name: name.into(),
            peer: service.peer().clone(),
            tools,
            timeout,
            _service: Mutex::new(service),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Call a tool and return its text output, or the failure as text.
    pub async fn call(&self, tool: &str, arguments: &str) -> String {
        let arguments = if arguments.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(arguments) {
                Ok(map) => Some(map),
                Err(e) => return format!("error: invalid arguments for {tool}: {e}"),
            }
        };
        let mut params = CallToolRequestParams::new(tool.to_owned());
        params.arguments = arguments;

        tracing::debug!("{}: calling {tool}", self.name);
        match tokio::time::timeout(self.timeout, self.peer.call_tool(params)).await {
            Ok(Ok(result)) if result.is_error == Some(true) => {
                format!("error: {tool} failed: {}", extract_text(&result.content))
            }
            Ok(Ok(result)) => {
                let text = extract_text(&result.content);
                tracing::trace!("{}: {tool} <- {text}", self.name);
                text
            }
            Ok(Err(e)) => {
                tracing::warn!("{}: {tool} failed: {e}", self.name);
                format!("error: {tool} failed: {e}")
            }
            Err(_) => {
                tracing::warn!("{}: {tool} timed out", self.name);
                format!("error: {tool} timed out after {}s", self.timeout.as_secs())
            }
        }
    }

    /// Register every tool of this server into `toolbox`.
    ///
    /// Names already taken are skipped.
    pub fn register(self: &Arc<Self>, toolbox: &mut Toolbox) {
        for tool in &self.tools {
            if toolbox.contains(&tool.name) {
                tracing::warn!("{}: tool {} already registered, skipping", self.name, tool.name);
                continue;
            }
            let server = Arc::clone(self);
            let name = tool.name.clone();
            toolbox.register(tool.clone(), move |arguments| {
                let server = Arc::clone(&server);
                let name = name.clone();
                async move { server.call(&name, &arguments).await }
            });
        }
    }
}

/// Convert an MCP tool definition into a chat tool schema.
pub fn convert_tool(tool: &rmcp::model::Tool) -> Tool {
    let schema = serde_json::to_value(tool.input_schema.as_ref()).unwrap_or_default();
    let parameters: schemars::Schema = serde_json::from_value(schema)
        .unwrap_or_else(|_| schemars::json_schema!({ "type": "object" }));

    Tool {
        name: CompactString::from(tool.name.as_ref()),
        description: tool
            .description
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        parameters,
        strict: false,
    }
}

fn extract_text(content: &[rmcp::model::Content]) -> String {
    content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
