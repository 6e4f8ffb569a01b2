//! Test registry - all test cases are registered here

pub mod basic;
pub mod helpers;

use crate::runner::TestCase;

/// Build and return all test cases
///
/// Each test:
/// 1. Queues a mock upstream response (what generateContent would return)
/// 2. Sends a request to the REAL proxy
/// 3. Validates the response
pub fn all_tests() -> Vec<TestCase> {
    macro_rules! test {
        ($name:expr, $desc:expr, $func:path) => {
            TestCase {
                name: $name,
                description: $desc,
                run: Box::new(|ctx| Box::pin($func(ctx))),
            }
        };
    }

    vec![
        // ── Basic behavior ────────────────────────────────────────────────────
        test!(
            "basic/prompt_returns_text",
            "Generated text is relayed as {\"text\": ...}",
            basic::test_prompt_returns_text
        ),
        test!(
            "basic/upstream_request_shape",
            "Upstream gets contents/parts payload, key parameter and JSON content type",
            basic::test_upstream_request_shape
        ),
        test!(
            "basic/unicode_prompt",
            "Non-ASCII, multi-line prompts and replies pass through intact",
            basic::test_unicode_prompt
        ),
        test!(
            "basic/repeatable",
            "Identical requests against an identical upstream give identical responses",
            basic::test_repeatable
        ),

        // ── Error branches ────────────────────────────────────────────────────
        test!(
            "errors/get_not_allowed",
            "GET returns 405 Method Not Allowed",
            errors::test_get_not_allowed
        ),
        test!(
            "errors/put_not_allowed",
            "PUT returns 405 Method Not Allowed",
            errors::test_put_not_allowed
        ),
        test!(
            "errors/missing_prompt",
            "POST {} returns 400 Prompt is required.",
            errors::test_missing_prompt
        ),
        test!(
            "errors/empty_prompt",
            "Empty prompt string returns 400",
            errors::test_empty_prompt
        ),
        test!(
            "errors/malformed_body",
            "Invalid JSON body returns 500 with an error envelope",
            errors::test_malformed_body
        ),
        test!(
            "errors/upstream_rate_limited",
            "Upstream 429 is passed through with a fixed message",
            errors::test_upstream_rate_limited
        ),
        test!(
            "errors/upstream_bad_request",
            "Upstream 400 body is logged, not relayed",
            errors::test_upstream_bad_request
        ),
        test!(
            "errors/no_candidates",
            "Upstream 200 without candidates returns 500",
            errors::test_no_candidates
        ),
        test!(
            "errors/upstream_html_page",
            "Upstream 200 with an HTML body returns a 500 error envelope",
            errors::test_upstream_html_page
        ),
        test!(
            "errors/upstream_html_gateway_error",
            "Upstream 502 HTML page is passed through with a fixed message",
            errors::test_upstream_html_gateway_error
        ),
        test!(
            "errors/cross_origin_preflight",
            "OPTIONS preflight from another origin returns 405 without CORS grants",
            errors::test_cross_origin_preflight
        ),
        test!(
            "errors/missing_api_key",
            "Proxy without a key returns 500 {\"error\":\"API key is not configured.\"}",
            errors::test_missing_api_key
        ),
    ]
}
