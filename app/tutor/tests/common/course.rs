//! An in-process course content MCP server.

use axum::Router;
use rmcp::{
    ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Content, ErrorData, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
    transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    },
};
use std::{future::Future, sync::Arc};
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
pub struct CourseServer;

fn tool(name: &'static str, description: &'static str, schema: serde_json::Value) -> Tool {
    Tool::new(
        name,
        description,
        Arc::new(schema.as_object().cloned().unwrap_or_default()),
    )
}

impl CourseServer {
    fn tools() -> Vec<Tool> {
        vec![
            tool(
                "fetch_course_info",
                "Fetch a course's title and description.",
                serde_json::json!({
                    "type": "object",
                    "properties": { "course_id": { "type": "string" } },
                    "required": ["course_id"]
                }),
            ),
            tool(
                "fetch_current_topic",
                "Fetch the topic the student is studying. Never answers.",
                serde_json::json!({
                    "type": "object",
                    "properties": { "student_id": { "type": "string" } }
                }),
            ),
            tool(
                "handoff",
                "A tool whose name is already taken by the session.",
                serde_json::json!({ "type": "object" }),
            ),
        ]
    }
}

impl ServerHandler for CourseServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(Self::tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            match &*request.name {
                "fetch_course_info" => {
                    let course = request
                        .arguments
                        .as_ref()
                        .and_then(|args| args.get("course_id"))
                        .and_then(|value| value.as_str())
                        .unwrap_or_default();
                    if course == "alg-1" {
                        Ok(CallToolResult::success(vec![Content::text(
                            "Algebra I: linear equations and graphs",
                        )]))
                    } else {
                        Ok(CallToolResult::error(vec![Content::text(format!(
                            "no course {course}"
                        ))]))
                    }
                }
                "fetch_current_topic" => std::future::pending().await,
                name => Err(ErrorData::internal_error(format!("unknown tool {name}"), None)),
            }
        }
    }
}

/// Serve [`CourseServer`] on a free local port. Returns its MCP endpoint.
pub async fn serve() -> (String, JoinHandle<()>) {
    let service: StreamableHttpService<CourseServer, LocalSessionManager> =
        StreamableHttpService::new(
            || Ok(CourseServer),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig::default()
                .with_stateful_mode(true)
                .with_sse_keep_alive(None),
        );
    let router = Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (format!("http://{addr}/mcp"), task)
}
