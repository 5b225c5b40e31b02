//! Tests for the shared OpenAI-compatible Request type.

use haka_llm::{General, Message, Request, Tool, ToolChoice};

fn search_tool() -> Tool {
    Tool {
        name: "search".into(),
        description: "find docs".into(),
        parameters: schemars::schema_for!(String),
        strict: false,
    }
}

#[test]
fn request_new_sets_model_and_sampling() {
    let general = General::default().with_sampling(0.3, 150, 0.3);
    let req = Request::new("gpt-3.5-turbo", &general);
    assert_eq!(req.model, "gpt-3.5-turbo");
    assert_eq!(req.temperature, Some(0.3));
    assert_eq!(req.max_tokens, Some(150));
    assert_eq!(req.top_p, Some(0.3));
}

#[test]
fn request_default_general_omits_sampling_fields() {
    let req = Request::new("gpt-4", &General::default());
    let body = serde_json::to_value(&req).unwrap();
    assert!(body.get("temperature").is_none());
    assert!(body.get("max_tokens").is_none());
    assert!(body.get("top_p").is_none());
    assert!(body.get("tools").is_none());
    assert!(body.get("stream").is_none());
}

#[test]
fn request_new_with_tools() {
    let general = General::default().with_tools(vec![search_tool()]);
    let req = Request::new("gpt-4", &general);
    let tools = req.tools.expect("tools");
    assert_eq!(tools[0]["type"], "function");
    assert_eq!(tools[0]["function"]["name"], "search");
}

#[test]
fn empty_tool_list_is_omitted() {
    let general = General::default().with_tools(Vec::new());
    let req = Request::new("gpt-4", &general);
    assert!(req.tools.is_none());
}

#[test]
fn request_with_tool_choice_auto() {
    let req = Request::new("m", &General::default()).with_tool_choice(ToolChoice::Auto);
    assert_eq!(
        req.tool_choice.expect("tool_choice"),
        serde_json::json!("auto")
    );
}

#[test]
fn request_with_tool_choice_required() {
    let req = Request::new("m", &General::default()).with_tool_choice(ToolChoice::Required);
    assert_eq!(
        req.tool_choice.expect("tool_choice"),
        serde_json::json!("required")
    );
}

#[test]
fn request_with_tool_choice_function() {
    let general = General::default().with_tool_choice(ToolChoice::Function("search".into()));
    let req = Request::new("gpt-4", &general);
    let choice = req.tool_choice.expect("tool_choice");
    assert_eq!(choice["type"], "function");
    assert_eq!(choice["function"]["name"], "search");
}

#[test]
fn request_stream_sets_include_usage() {
    let req = Request::new("m", &General::default()).stream(true);
    assert_eq!(req.stream, Some(true));
    let opts = req.stream_options.expect("stream_options");
    assert_eq!(opts["include_usage"], true);
}

#[test]
fn request_stream_without_usage_omits_stream_options() {
    let req = Request::new("m", &General::default()).stream(false);
    assert_eq!(req.stream, Some(true));
    assert!(req.stream_options.is_none());
}

#[test]
fn messages_serialize_with_roles() {
    let req = Request::new("m", &General::default())
        .messages(&[Message::system("be kind"), Message::user("hi")]);
    let body = serde_json::to_value(&req).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "hi");
    assert!(body["messages"][1].get("tool_calls").is_none());
}
