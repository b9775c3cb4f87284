// htmlscrub-core/tests/middleware_tests.rs
use std::cell::Cell;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use htmlscrub_core::{
    AmmoniaEngine, Fields, Purifier, PurifierSettings, PurifyMiddleware, Request, SanitizerConfig, ScrubError,
    ScrubResult, ValidatorRegistry, Value,
};

struct Failing;

impl Purifier for Failing {
    fn purify(&self, _input: &str, _config: &SanitizerConfig) -> ScrubResult<String> {
        Err(ScrubError::Engine("engine offline".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn middleware_with(yaml: &str, purifier: Arc<dyn Purifier>) -> PurifyMiddleware {
    let settings = PurifierSettings::from_yaml_str(yaml).unwrap();
    PurifyMiddleware::new(Arc::new(settings), purifier, Arc::new(ValidatorRegistry::default()))
}

const SETTINGS: &str = r#"
settings:
  default:
    HTML.Allowed: "p,b,a[href]"
  plain:
    HTML.Allowed: ""
"#;

fn comment_request(method: &str) -> Request {
    Request::new(method, "/comments")
        .with_field("body", "<p>Hi <b>there</b><script>steal()</script></p>")
        .with_field("tags", Value::from(json!(["<i>news</i>", "<script></script>"])))
        .with_field("draft", false)
}

#[test]
fn test_post_is_sanitized_before_next() -> Result<()> {
    let middleware = middleware_with(SETTINGS, Arc::new(AmmoniaEngine::new()));
    let fields = middleware.handle(comment_request("POST"), Request::into_fields)?;

    assert_eq!(fields["body"], Value::from("<p>Hi <b>there</b></p>"));
    assert_eq!(fields["tags"], Value::from(json!(["news", null])));
    assert_eq!(fields["draft"], Value::from(false));
    Ok(())
}

#[test]
fn test_put_and_patch_are_sanitized() -> Result<()> {
    let middleware = middleware_with(SETTINGS, Arc::new(AmmoniaEngine::new()));
    for method in ["PUT", "PATCH"] {
        let fields = middleware.handle(comment_request(method), Request::into_fields)?;
        assert_eq!(fields["body"], Value::from("<p>Hi <b>there</b></p>"));
    }
    Ok(())
}

#[test_log::test]
fn test_other_methods_pass_through_untouched() -> Result<()> {
    let middleware = middleware_with(SETTINGS, Arc::new(AmmoniaEngine::new()));
    for method in ["GET", "DELETE", "OPTIONS", "post"] {
        let original = comment_request(method);
        let forwarded = middleware.handle(original.clone(), |request| request)?;
        assert_eq!(forwarded, original);
    }
    Ok(())
}

#[test]
fn test_other_methods_skip_the_engine() -> Result<()> {
    let middleware = middleware_with(SETTINGS, Arc::new(Failing));
    let forwarded = middleware.handle(comment_request("GET"), |request| request.method().to_string())?;
    assert_eq!(forwarded, "GET");
    Ok(())
}

#[test]
fn test_engine_failure_stops_the_request() {
    let middleware = middleware_with(SETTINGS, Arc::new(Failing));
    let called = Cell::new(false);
    let result = middleware.handle(comment_request("POST"), |_| called.set(true));
    assert!(matches!(result, Err(ScrubError::Engine(_))));
    assert!(!called.get());
}

#[test]
fn test_profile_selection() -> Result<()> {
    let middleware = middleware_with(SETTINGS, Arc::new(AmmoniaEngine::new())).with_profile("plain");
    assert_eq!(middleware.profile(), Some("plain"));

    let request = Request::new("POST", "/notes").with_field("text", "<b>bold</b> move");
    let fields: Fields = middleware.handle(request, Request::into_fields)?;
    assert_eq!(fields["text"], Value::from("bold move"));
    Ok(())
}

#[test]
fn test_empty_request_is_forwarded() -> Result<()> {
    let middleware = middleware_with(SETTINGS, Arc::new(AmmoniaEngine::new()));
    let fields = middleware.handle(Request::new("POST", "/ping"), Request::into_fields)?;
    assert!(fields.is_empty());
    Ok(())
}
