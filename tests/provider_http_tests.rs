use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use tiny_trip_rs::{
    ItineraryError, ItineraryOrchestrator, ItineraryRequest, OpenAiClient, OpenRouterClient,
    PromptSpec, ProviderSettings, SourceTag, TextGenerationClient,
};

fn request() -> ItineraryRequest {
    ItineraryRequest::new(
        "Porto",
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        2,
        ["food_wine"],
    )
    .unwrap()
}

fn prompt() -> PromptSpec {
    PromptSpec::from_request(&request(), &[])
}

fn settings(server: &Server) -> ProviderSettings {
    ProviderSettings::new(Some("test-key".to_string()), server.url(), "test-model")
}

fn completion(content: &str) -> String {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string()
}

const TWO_DAY_ANSWER: &str = r#"Sure! Here is your plan:
```json
{"days":[
  {"day":1,"date":"2024-06-10","activities":[{"name":"Livraria Lello","timeOfDay":"Morning","description":"Bookshop."}]},
  {"day":2,"activities":["Ribeira Waterfront","Port Wine Cellars"]}
]}
```
Enjoy!"#;

#[tokio::test]
async fn test_openrouter_sends_instruction_prompt_and_returns_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_header("x-title", Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "model": "test-model",
            "max_tokens": 2048,
            "top_p": 0.9
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("{\"days\":[]}"))
        .create_async()
        .await;

    let client = OpenRouterClient::new(settings(&server)).unwrap();
    let text = client.generate(&prompt()).await.unwrap();

    assert_eq!(text, "{\"days\":[]}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_requests_json_mode() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "response_format": { "type": "json_object" }
        })))
        .with_status(200)
        .with_body(completion("{\"days\":[]}"))
        .create_async()
        .await;

    let client = OpenAiClient::new(settings(&server)).unwrap();
    assert!(client.generate(&prompt()).await.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("retry-after", "7")
        .with_body(r#"{"error":{"message":"Rate limit exceeded: free-models-per-day"}}"#)
        .create_async()
        .await;

    let client = OpenRouterClient::new(settings(&server)).unwrap();
    let err = client.generate(&prompt()).await.unwrap_err();

    match &err {
        ItineraryError::ProviderHttp {
            status,
            rate_limited,
            retry_after,
            message,
            ..
        } => {
            assert_eq!(*status, 429);
            assert!(*rate_limited);
            assert_eq!(*retry_after, Some(7));
            assert!(message.contains("free-models-per-day"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.is_fallback_trigger());
}

#[tokio::test]
async fn test_error_envelope_with_success_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"error":{"message":"Provider returned error","code":502}}"#)
        .create_async()
        .await;

    let client = OpenRouterClient::new(settings(&server)).unwrap();
    let err = client.generate(&prompt()).await.unwrap_err();
    assert!(matches!(err, ItineraryError::ProviderHttp { status: 502, .. }));
}

#[tokio::test]
async fn test_reasoning_field_is_used_when_content_is_empty() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(
            json!([{ "choices": [{ "message": {
                "content": "",
                "reasoning": "Planning... {\"days\":[]}"
            } }] }])
            .to_string(),
        )
        .create_async()
        .await;

    let client = OpenRouterClient::new(settings(&server)).unwrap();
    let text = client.generate(&prompt()).await.unwrap();
    assert_eq!(text, "Planning... {\"days\":[]}");
}

#[tokio::test]
async fn test_empty_completion_is_reported() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":null}}]}"#)
        .create_async()
        .await;

    let client = OpenAiClient::new(settings(&server)).unwrap();
    let err = client.generate(&prompt()).await.unwrap_err();
    assert!(matches!(err, ItineraryError::ProviderEmptyResponse { .. }));
}

#[tokio::test]
async fn test_non_json_body_is_transport_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let client = OpenAiClient::new(settings(&server)).unwrap();
    let err = client.generate(&prompt()).await.unwrap_err();
    assert_eq!(err.error_code(), "PROVIDER_TRANSPORT_ERROR");
}

#[tokio::test]
async fn test_both_providers_failing_over_http_yields_mock() {
    let mut primary = Server::new_async().await;
    let _primary = primary
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;
    let mut secondary = Server::new_async().await;
    let _secondary = secondary
        .mock("POST", "/chat/completions")
        .with_status(503)
        .create_async()
        .await;

    let orchestrator = ItineraryOrchestrator::new()
        .with_provider(Arc::new(OpenRouterClient::new(settings(&primary)).unwrap()))
        .with_unenriched_provider(Arc::new(OpenAiClient::new(settings(&secondary)).unwrap()))
        .with_seed(11);

    let result = orchestrator.generate(&request()).await;

    assert_eq!(result.source, SourceTag::Mock);
    assert_eq!(result.failure_count(), 2);
    assert!(result.itinerary.is_well_formed());
    assert_eq!(serde_json::to_value(&result).unwrap()["source"], "mock");
}

#[tokio::test]
async fn test_decorated_primary_answer_is_normalized() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion(TWO_DAY_ANSWER))
        .create_async()
        .await;

    let orchestrator = ItineraryOrchestrator::new()
        .with_provider(Arc::new(OpenRouterClient::new(settings(&server)).unwrap()));
    let result = orchestrator.generate(&request()).await;

    assert_eq!(result.source, SourceTag::ProviderA);
    let days = &result.itinerary.days;
    assert_eq!(days.len(), 2);
    assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 6, 11).unwrap());
    assert_eq!(days[1].activities[1].name, "Port Wine Cellars");
    assert_eq!(days[1].activities[1].order_index, 1);
}
