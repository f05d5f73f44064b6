use axum::{ extract::State, http::StatusCode, response::{ IntoResponse, Response }, routing::post, Json, Router };
use gpt_relay::bot::BotRelay;
use gpt_relay::cli::repl::{ run_repl, ReplExit, CLI_CHAT };
use gpt_relay::history::SessionManager;
use gpt_relay::llm::chat::new_client;
use gpt_relay::llm::{ FailureKind, LlmConfig };
use gpt_relay::models::chat::{ ChatMessage, Role };
use gpt_relay::replies::{ failure_message, BOT_GREETING_TEMPLATE };
use serde_json::{ json, Value };
use std::sync::{ Arc, Mutex };
use tokio::net::TcpListener;

/// Fake chat-completions endpoint that answers "reply N" and can be told to
/// rate-limit, reject, or send empty content for the next request.
#[derive(Clone, Default)]
struct Provider {
    requests: Arc<Mutex<Vec<Value>>>,
    next_status: Arc<Mutex<Option<StatusCode>>>,
    blank_next: Arc<Mutex<bool>>,
}

async fn completions(State(provider): State<Provider>, Json(body): Json<Value>) -> Response {
    let count = {
        let mut requests = provider.requests.lock().unwrap();
        requests.push(body);
        requests.len()
    };
    let forced = provider.next_status.lock().unwrap().take();
    let blank = std::mem::take(&mut *provider.blank_next.lock().unwrap());
    if blank {
        return Json(json!({ "choices": [{ "message": { "role": "assistant", "content": "" } }] })).into_response();
    }
    match forced {
        Some(status) =>
            (status, Json(json!({ "error": { "message": format!("forced {}", status) } }))).into_response(),
        None =>
            Json(
                json!({
                "choices": [{ "message": { "role": "assistant", "content": format!("reply {}", count) } }]
            })
            ).into_response(),
    }
}

async fn spawn_provider() -> (Provider, LlmConfig) {
    let provider = Provider::default();
    let router = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(provider.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = LlmConfig {
        api_key: "sk-test".into(),
        completion_model: Some("gpt-3.5-turbo".into()),
        base_url: Some(format!("http://{}", addr)),
        max_tokens: None,
        timeout_secs: 5,
    };
    (provider, config)
}

#[tokio::test]
async fn rate_limited_turn_leaves_no_trace_in_history() {
    let (provider, config) = spawn_provider().await;
    let sessions = SessionManager::new(new_client(&config).unwrap(), "persona", 11);

    assert_eq!(sessions.exchange(10, "hello").await.unwrap(), "reply 1");
    let before = sessions.snapshot(10).await.unwrap();

    *provider.next_status.lock().unwrap() = Some(StatusCode::TOO_MANY_REQUESTS);
    let err = sessions.exchange(10, "are you there?").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RateLimited);
    assert_eq!(sessions.snapshot(10).await.unwrap(), before);

    assert_eq!(sessions.exchange(10, "again").await.unwrap(), "reply 3");
    let requests = provider.requests.lock().unwrap();
    let last_messages = requests[2]["messages"].as_array().unwrap();
    let contents: Vec<&str> = last_messages
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["persona", "hello", "reply 1", "again"]);
    assert_eq!(requests[2]["model"], "gpt-3.5-turbo");
}

#[tokio::test]
async fn history_is_bounded_over_many_turns() {
    let (provider, config) = spawn_provider().await;
    let sessions = SessionManager::new(new_client(&config).unwrap(), "persona", 11);

    for i in 0..15 {
        sessions.exchange(77, &format!("turn {i}")).await.unwrap();
    }

    let history = sessions.snapshot(77).await.unwrap();
    assert_eq!(history.len(), 11);
    assert_eq!(history[0], ChatMessage::system("persona"));
    assert_eq!(history[1], ChatMessage::user("turn 10"));
    assert_eq!(history[10], ChatMessage::assistant("reply 15"));
    assert!(history[1..].chunks(2).all(|pair| pair[0].role == Role::User && pair[1].role == Role::Assistant));

    // the provider never saw more than max_len - 1 stored messages plus the new turn
    let requests = provider.requests.lock().unwrap();
    assert!(requests.iter().all(|r| r["messages"].as_array().unwrap().len() <= 12));
}

#[tokio::test]
async fn terminal_chat_stops_on_rejected_key() {
    let (provider, config) = spawn_provider().await;
    let sessions = SessionManager::new(new_client(&config).unwrap(), "persona", 11);
    *provider.next_status.lock().unwrap() = Some(StatusCode::UNAUTHORIZED);

    let mut out = Vec::new();
    let exit = run_repl(&sessions, &b"hi\nstill there?\n"[..], &mut out).await.unwrap();

    assert_eq!(exit, ReplExit::AuthFailed);
    assert_eq!(provider.requests.lock().unwrap().len(), 1);
    assert_eq!(sessions.snapshot(CLI_CHAT).await.unwrap(), vec![ChatMessage::system("persona")]);
}

#[tokio::test]
async fn empty_reply_is_reported_to_the_chat_and_rolled_back() {
    let (provider, config) = spawn_provider().await;
    let sessions = Arc::new(SessionManager::new(new_client(&config).unwrap(), "persona", 11));
    let relay = BotRelay::new(Arc::clone(&sessions), BOT_GREETING_TEMPLATE);

    assert_eq!(relay.reply_to_text(21, "hello").await, "reply 1");
    let before = sessions.snapshot(21).await.unwrap();

    *provider.blank_next.lock().unwrap() = true;
    let reply = relay.reply_to_text(21, "say nothing").await;

    assert_eq!(reply, failure_message(FailureKind::UnknownError));
    assert_eq!(sessions.snapshot(21).await.unwrap(), before);
    assert_eq!(relay.reply_to_text(21, "again").await, "reply 3");
}
