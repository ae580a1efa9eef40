use futures::future::BoxFuture;
use response_regex::core::ExtractError;
use response_regex::host::{MemoryHost, RenderContext, RequestStore, ResponseStore, Transport};
use response_regex::models::{RenderPurpose, Request, ResponseDescriptor};
use response_regex::policy::TriggerBehavior;
use response_regex::tag::{ResponseRegex, TagArgs};
use response_regex::test_utils::{HostBuilder, init_test_logging, test_now};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Request store that counts lookups.
struct CountingRequests {
    inner: Arc<MemoryHost>,
    lookups: AtomicUsize,
}

impl RequestStore for CountingRequests {
    fn get_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Request>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id)
    }
}

fn args(request_id: &str, pattern: &str, behavior: TriggerBehavior) -> TagArgs {
    TagArgs::new(request_id, pattern, &Default::default()).with_trigger_behavior(behavior)
}

#[tokio::test]
async fn test_never_uses_cached_response() -> anyhow::Result<()> {
    init_test_logging(None);
    let host = HostBuilder::new().request("req_login").response("req_login", 3600, "token=ABC123").build();
    let tag = ResponseRegex::new(host.clone());
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let value = tag
        .evaluate(&mut ctx, &args("req_login", r"token=(\w+)", TriggerBehavior::Never), test_now())
        .await?;

    assert_eq!(value, "ABC123");
    assert!(host.sent_requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_no_history_resends_when_nothing_cached() -> anyhow::Result<()> {
    init_test_logging(None);
    let host = HostBuilder::new().request("req_create").resend("req_create", 200, "id=42").build();
    let tag = ResponseRegex::new(host.clone());
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let value = tag
        .evaluate(&mut ctx, &args("req_create", r"id=(\d+)", TriggerBehavior::NoHistory), test_now())
        .await?;

    assert_eq!(value, "42");
    let sent = host.sent_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].request_id, "req_create");
    assert_eq!(sent[0].chain.iter().collect::<Vec<_>>(), vec!["req_create"]);
    Ok(())
}

#[tokio::test]
async fn test_pattern_without_group_fails_before_lookup() {
    init_test_logging(None);
    let host = HostBuilder::new().request("req_1").response("req_1", 0, "foo").build();
    let requests = Arc::new(CountingRequests {
        inner: host.clone(),
        lookups: AtomicUsize::new(0),
    });
    let tag = ResponseRegex::from_parts(requests.clone(), host.clone(), host.clone());
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let result = tag.evaluate(&mut ctx, &args("req_1", "foo", TriggerBehavior::Always), test_now()).await;

    match result {
        Err(ExtractError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "foo"),
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
    assert_eq!(requests.lookups.load(Ordering::SeqCst), 0);
    assert!(host.sent_requests().is_empty());
}

#[tokio::test]
async fn test_invalid_pattern_reported_before_missing_request() {
    let host = Arc::new(MemoryHost::new());
    let tag = ResponseRegex::new(host);
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let result = tag.run(&mut ctx, None, "(unclosed", TriggerBehavior::Never, 60).await;
    assert!(matches!(result, Err(ExtractError::InvalidPattern { .. })));
}

#[tokio::test]
async fn test_status_zero_is_not_successful() {
    let builder = HostBuilder::new().request("req_1");
    let mut descriptor = builder.descriptor("req_1", 5);
    descriptor.status_code = 0;
    let host = builder.raw_response(descriptor, b"id=1").build();
    let tag = ResponseRegex::new(host);
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let result = tag.evaluate(&mut ctx, &args("req_1", r"id=(\d+)", TriggerBehavior::Never), test_now()).await;
    assert!(matches!(result, Err(ExtractError::NoSuccessfulResponse)));
}

#[tokio::test]
async fn test_request_in_chain_is_not_resent() -> anyhow::Result<()> {
    let host = HostBuilder::new()
        .request("req_1")
        .response("req_1", 10, "id=cached")
        .resend("req_1", 200, "id=fresh")
        .build();
    let tag = ResponseRegex::new(host.clone());
    let mut ctx = RenderContext::new(RenderPurpose::Send);
    ctx.set_request_chain(&["req_1".to_string()].into_iter().collect());

    let value = tag.evaluate(&mut ctx, &args("req_1", r"id=(\w+)", TriggerBehavior::Always), test_now()).await?;
    assert_eq!(value, "cached");
    assert!(host.sent_requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_request_in_chain_without_history_has_no_response() {
    let host = HostBuilder::new().request("req_1").resend("req_1", 200, "id=fresh").build();
    let tag = ResponseRegex::new(host.clone());
    let mut ctx = RenderContext::new(RenderPurpose::Send);
    ctx.set_request_chain(&["req_1".to_string()].into_iter().collect());

    let result = tag.evaluate(&mut ctx, &args("req_1", r"id=(\w+)", TriggerBehavior::Always), test_now()).await;
    assert!(matches!(result, Err(ExtractError::NoResponse)));
    assert!(host.sent_requests().is_empty());
}

#[tokio::test]
async fn test_unknown_request() {
    let host = Arc::new(MemoryHost::new());
    let tag = ResponseRegex::new(host);
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let result = tag.run(&mut ctx, Some("req_gone"), r"(x)", TriggerBehavior::Never, 60).await;
    match result {
        Err(e @ ExtractError::RequestNotFound { .. }) => {
            assert_eq!(e.to_string(), "Could not find request req_gone");
        }
        other => panic!("expected RequestNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_match_in_body() {
    let host = HostBuilder::new().request("req_1").response("req_1", 0, "nothing here").build();
    let tag = ResponseRegex::new(host);
    let mut ctx = RenderContext::new(RenderPurpose::General);

    let result = tag.evaluate(&mut ctx, &args("req_1", r"id=(\d+)", TriggerBehavior::Never), test_now()).await;
    assert!(matches!(result, Err(ExtractError::NoMatch)));
}

#[tokio::test]
async fn test_first_match_wins() -> anyhow::Result<()> {
    let host = HostBuilder::new().request("req_1").response("req_1", 0, "id=1\nid=2\nid=3").build();
    let tag = ResponseRegex::new(host);
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let value = tag.evaluate(&mut ctx, &args("req_1", r"^id=(\d+)$", TriggerBehavior::Never), test_now()).await?;
    assert_eq!(value, "1");
    Ok(())
}

#[tokio::test]
async fn test_when_expired_boundary() -> anyhow::Result<()> {
    let host = HostBuilder::new()
        .request("fresh")
        .response("fresh", 60, "v=old")
        .resend("fresh", 200, "v=new")
        .request("stale")
        .response("stale", 61, "v=old")
        .resend("stale", 200, "v=new")
        .build();
    let tag = ResponseRegex::new(host.clone());
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let at_limit = args("fresh", r"v=(\w+)", TriggerBehavior::WhenExpired).with_max_age(60);
    assert_eq!(tag.evaluate(&mut ctx, &at_limit, test_now()).await?, "old");

    let past_limit = args("stale", r"v=(\w+)", TriggerBehavior::WhenExpired).with_max_age(60);
    assert_eq!(tag.evaluate(&mut ctx, &past_limit, test_now()).await?, "new");

    let sent: Vec<_> = host.sent_requests().into_iter().map(|s| s.request_id).collect();
    assert_eq!(sent, vec!["stale"]);
    Ok(())
}

#[tokio::test]
async fn test_second_tag_in_same_render_does_not_resend_again() -> anyhow::Result<()> {
    let host = HostBuilder::new().request("req_1").resend("req_1", 200, "a=1 b=2").build();
    let tag = ResponseRegex::new(host.clone());
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let first = tag.evaluate(&mut ctx, &args("req_1", r"a=(\d)", TriggerBehavior::Always), test_now()).await?;
    let second = tag.evaluate(&mut ctx, &args("req_1", r"b=(\d)", TriggerBehavior::Always), test_now()).await?;

    assert_eq!((first.as_str(), second.as_str()), ("1", "2"));
    assert_eq!(host.sent_requests().len(), 1);
    Ok(())
}

/// Transport that always fails, as a host would report a refused connection.
struct FailingTransport;

impl Transport for FailingTransport {
    fn send_request<'a>(
        &'a self,
        request: &'a Request,
        _extra_info: Vec<response_regex::models::ExtraInfo>,
    ) -> BoxFuture<'a, ResponseDescriptor> {
        Box::pin(async move {
            ResponseDescriptor {
                id: "res_failed".to_string(),
                request_id: request.id.clone(),
                environment_id: None,
                created: test_now(),
                status_code: 0,
                error: Some("connect ECONNREFUSED 127.0.0.1:80".to_string()),
                content_type: None,
            }
        })
    }
}

#[tokio::test]
async fn test_transport_failure_surfaces_error_text() {
    let host = HostBuilder::new().request("req_1").response("req_1", 0, "id=1").build();
    let tag = ResponseRegex::from_parts(host.clone(), host.clone(), Arc::new(FailingTransport));
    let mut ctx = RenderContext::new(RenderPurpose::Send);

    let result = tag.evaluate(&mut ctx, &args("req_1", r"id=(\d)", TriggerBehavior::Always), test_now()).await;
    let err = result.expect_err("resend failed");
    assert!(matches!(err, ExtractError::DependentRequestFailed { .. }));
    assert!(err.to_string().contains("ECONNREFUSED"));
}

#[tokio::test]
async fn test_positional_arguments() -> anyhow::Result<()> {
    let host = HostBuilder::new().request("req_1").response("req_1", 0, "n=7").build();
    let tag = ResponseRegex::new(host);
    let mut ctx = RenderContext::new(RenderPurpose::Preview);

    let values = [
        serde_json::json!({ "value": "req_1" }),
        serde_json::json!(r"n=(\d)"),
        serde_json::json!("when-expired"),
        serde_json::json!("3600"),
    ];
    assert_eq!(tag.run_with_args(&mut ctx, &values).await?, "7");
    Ok(())
}

#[test]
fn test_response_store_trait_object() {
    let host: Arc<dyn ResponseStore> = Arc::new(MemoryHost::new());
    let descriptor = HostBuilder::new().descriptor("req_1", 0);
    assert!(host.body_buffer(&descriptor).is_empty());
}
