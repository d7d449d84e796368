use clipper_core::{
    ApiKey, ClipperError, PairingStrategy, Provider, TranscriptEntry,
    suggest::{ChatCompletion, OpenAiChat, SYSTEM_PROMPT, suggest_clips},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn chat(server: &MockServer) -> OpenAiChat {
    OpenAiChat::new(&Provider::Openai, "gpt-4o", ApiKey::new("sk-test"))
        .with_api_url(format!("{}/v1/chat/completions", server.uri()))
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

#[tokio::test]
async fn sends_model_and_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = chat(&server).complete(SYSTEM_PROMPT, "hello").await.unwrap();
    assert_eq!(reply, "hi");
}

#[tokio::test]
async fn suggestion_parses_the_model_reply() {
    let server = MockServer::start().await;
    let reply = "Clip 1:\n- **Start time:** 0\n- **End time:** 10\n- Transcript: \"hello\"\n\nClip 2:\n- **Start time:** 20\n- **End time:** 30\n";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .mount(&server)
        .await;

    let transcript = vec![TranscriptEntry {
        text: "hello".to_string(),
        start: 0.0,
        duration: 2.0,
    }];
    let clips = suggest_clips(
        &chat(&server),
        &transcript,
        "Find greetings.",
        PairingStrategy::Positional,
    )
    .await
    .unwrap();

    let pairs: Vec<(f64, f64)> = clips.iter().map(|c| (c.start, c.end)).collect();
    assert_eq!(pairs, vec![(0.0, 10.0), (20.0, 30.0)]);
}

#[tokio::test]
async fn auth_failure_is_a_suggestion_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = chat(&server).complete(SYSTEM_PROMPT, "hello").await.unwrap_err();
    match err {
        ClipperError::SuggestionFailed { reason } => {
            assert!(reason.contains("401"));
            assert!(reason.contains("Incorrect API key provided"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn reply_without_choices_is_a_suggestion_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let err = chat(&server).complete(SYSTEM_PROMPT, "hello").await.unwrap_err();
    assert!(matches!(err, ClipperError::SuggestionFailed { .. }));
}
