//! Resends render the dependent request's template, which can contain more
//! response tags. These tests wire a transport that does exactly that.

use futures::future::{BoxFuture, FutureExt};
use response_regex::core::ExtractError;
use response_regex::host::{MemoryHost, RenderContext, Transport};
use response_regex::models::{ExtraInfo, RenderPurpose, Request, ResponseDescriptor};
use response_regex::policy::TriggerBehavior;
use response_regex::tag::ResponseRegex;
use response_regex::test_utils::{HostBuilder, init_test_logging};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// One response tag inside a request's template.
struct TemplateTag {
    depends_on: &'static str,
    pattern: &'static str,
}

/// Transport that renders the sent request's template before delegating to
/// the in-memory host.
struct RenderingTransport {
    host: Arc<MemoryHost>,
    templates: HashMap<&'static str, TemplateTag>,
    engine: OnceLock<ResponseRegex>,
    rendered: Mutex<Vec<(String, Result<String, ExtractError>)>>,
}

impl RenderingTransport {
    fn rendered(&self) -> Vec<(String, Result<String, ExtractError>)> {
        self.rendered.lock().unwrap().clone()
    }
}

impl Transport for RenderingTransport {
    fn send_request<'a>(
        &'a self,
        request: &'a Request,
        extra_info: Vec<ExtraInfo>,
    ) -> BoxFuture<'a, ResponseDescriptor> {
        async move {
            let template = self.templates.get(request.id.as_str());
            if let (Some(tag), Some(engine)) = (template, self.engine.get()) {
                let mut ctx = RenderContext::nested(RenderPurpose::Send, extra_info.clone());
                let result =
                    engine.run(&mut ctx, Some(tag.depends_on), tag.pattern, TriggerBehavior::Always, 60).await;
                self.rendered.lock().unwrap().push((request.id.clone(), result));
            }
            self.host.send_request(request, extra_info).await
        }
        .boxed()
    }
}

fn wire(host: Arc<MemoryHost>, templates: HashMap<&'static str, TemplateTag>) -> (ResponseRegex, Arc<RenderingTransport>) {
    let transport = Arc::new(RenderingTransport {
        host: host.clone(),
        templates,
        engine: OnceLock::new(),
        rendered: Mutex::new(Vec::new()),
    });
    let engine = ResponseRegex::from_parts(host.clone(), host, transport.clone());
    assert!(transport.engine.set(engine.clone()).is_ok());
    (engine, transport)
}

#[tokio::test]
async fn test_cyclic_dependencies_terminate() -> anyhow::Result<()> {
    init_test_logging(None);
    let host = HostBuilder::new()
        .request("req_a")
        .request("req_b")
        .response("req_a", 30, "a=cached")
        .resend("req_a", 200, "a=fresh")
        .resend("req_b", 200, "b=fresh")
        .build();

    let templates = HashMap::from([
        ("req_a", TemplateTag { depends_on: "req_b", pattern: r"b=(\w+)" }),
        ("req_b", TemplateTag { depends_on: "req_a", pattern: r"a=(\w+)" }),
    ]);
    let (engine, transport) = wire(host.clone(), templates);

    let mut ctx = RenderContext::new(RenderPurpose::Send);
    let value = engine.run(&mut ctx, Some("req_a"), r"a=(\w+)", TriggerBehavior::Always, 60).await?;
    assert_eq!(value, "fresh");

    let sent: Vec<_> = host
        .sent_requests()
        .into_iter()
        .map(|s| (s.request_id, s.chain.iter().map(String::from).collect::<Vec<_>>()))
        .collect();
    assert_eq!(
        sent,
        vec![
            ("req_b".to_string(), vec!["req_a".to_string(), "req_b".to_string()]),
            ("req_a".to_string(), vec!["req_a".to_string()]),
        ]
    );

    // req_b's template hit the guard and fell back to the cached req_a response
    let rendered = transport.rendered();
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].0, "req_b");
    assert_eq!(rendered[0].1.as_deref().ok(), Some("cached"));
    assert_eq!(rendered[1].0, "req_a");
    assert_eq!(rendered[1].1.as_deref().ok(), Some("fresh"));
    Ok(())
}

#[tokio::test]
async fn test_self_dependency_without_history_fails_inside_nested_render() -> anyhow::Result<()> {
    let host = HostBuilder::new().request("req_a").resend("req_a", 200, "a=1").build();
    let templates = HashMap::from([("req_a", TemplateTag { depends_on: "req_a", pattern: r"a=(\d)" })]);
    let (engine, transport) = wire(host.clone(), templates);

    let mut ctx = RenderContext::new(RenderPurpose::Send);
    let value = engine.run(&mut ctx, Some("req_a"), r"a=(\d)", TriggerBehavior::NoHistory, 60).await?;
    assert_eq!(value, "1");
    assert_eq!(host.sent_requests().len(), 1);

    let rendered = transport.rendered();
    assert_eq!(rendered.len(), 1);
    assert!(matches!(rendered[0].1, Err(ExtractError::NoResponse)));
    Ok(())
}

#[tokio::test]
async fn test_root_chain_is_not_shared_between_renders() -> anyhow::Result<()> {
    let host = HostBuilder::new().request("req_a").resend("req_a", 200, "a=1").build();
    let (engine, _transport) = wire(host.clone(), HashMap::new());

    for _ in 0..2 {
        let mut ctx = RenderContext::new(RenderPurpose::Send);
        engine.run(&mut ctx, Some("req_a"), r"a=(\d)", TriggerBehavior::Always, 60).await?;
    }
    assert_eq!(host.sent_requests().len(), 2);
    Ok(())
}
