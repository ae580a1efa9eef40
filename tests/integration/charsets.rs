use response_regex::host::RenderContext;
use response_regex::models::RenderPurpose;
use response_regex::policy::TriggerBehavior;
use response_regex::tag::{ResponseRegex, TagArgs};
use response_regex::test_utils::{HostBuilder, test_now};

async fn extract(content_type: Option<&str>, body: &[u8], pattern: &str) -> anyhow::Result<String> {
    let builder = HostBuilder::new().request("req_1");
    let mut descriptor = builder.descriptor("req_1", 0);
    descriptor.content_type = content_type.map(String::from);
    let host = builder.raw_response(descriptor, body).build();

    let tag = ResponseRegex::new(host);
    let mut ctx = RenderContext::new(RenderPurpose::Send);
    let args = TagArgs::new("req_1", pattern, tag.config()).with_trigger_behavior(TriggerBehavior::Never);
    Ok(tag.evaluate(&mut ctx, &args, test_now()).await?)
}

#[tokio::test]
async fn test_latin1_body() -> anyhow::Result<()> {
    let value = extract(Some("text/html; charset=ISO-8859-1"), b"name=caf\xe9;", r"name=([^;]+)").await?;
    assert_eq!(value, "café");
    Ok(())
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_utf8() -> anyhow::Result<()> {
    let value = extract(None, "name=naïve;".as_bytes(), r"name=([^;]+)").await?;
    assert_eq!(value, "naïve");
    Ok(())
}

#[tokio::test]
async fn test_unsupported_charset_still_extracts() -> anyhow::Result<()> {
    let value = extract(Some("text/plain; charset=x-made-up"), b"id=42", r"id=(\d+)").await?;
    assert_eq!(value, "42");
    Ok(())
}

#[tokio::test]
async fn test_mislabelled_body_falls_back_leniently() -> anyhow::Result<()> {
    // labelled UTF-8 but not valid UTF-8
    let value = extract(Some("application/json; charset=utf-8"), b"{\"id\":\"a\xffb\"}", r#""id":"([^"]+)""#).await?;
    assert_eq!(value, "a\u{FFFD}b");
    Ok(())
}

#[tokio::test]
async fn test_stray_byte_keeps_multibyte_text() -> anyhow::Result<()> {
    let value = extract(Some("text/plain; charset=utf-8"), b"name=Zo\xc3\xab;\xff", r"name=([^;]+)").await?;
    assert_eq!(value, "Zo\u{eb}");
    Ok(())
}

#[tokio::test]
async fn test_latin1_is_not_windows_1252() -> anyhow::Result<()> {
    let value = extract(Some("text/plain; charset=iso-8859-1"), b"sym=\x80;", r"sym=([^;]+)").await?;
    assert_eq!(value, "\u{80}");
    Ok(())
}

#[tokio::test]
async fn test_utf16_with_bom() -> anyhow::Result<()> {
    let mut body = vec![0xFF, 0xFE];
    for unit in "token=XYZ".encode_utf16() {
        body.extend_from_slice(&unit.to_le_bytes());
    }
    let value = extract(Some("text/plain; charset=utf-16le"), &body, r"token=(\w+)").await?;
    assert_eq!(value, "XYZ");
    Ok(())
}
