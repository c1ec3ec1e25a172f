//! Integration tests for `HttpLedger` against a canned single-response HTTP server.
//!
//! Each test binds a loopback listener, serves one response, and hands back the
//! raw request so the test can assert on method, path and body.

use bourse_ledger::{HttpLedger, Ledger, LedgerError};
use bourse_models::config::LedgerConfig;
use bourse_models::{LedgerAction, NewAgent, TradeOrder};
use rust_decimal_macros::dec;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one HTTP response; the handle resolves to the raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if request_complete(&buf) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });

    (format!("http://{addr}/api"), handle)
}

fn request_complete(buf: &[u8]) -> bool {
    let text = String::from_utf8_lossy(buf);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    buf.len() >= header_end + 4 + content_length
}

fn ledger(base_url: String) -> HttpLedger {
    HttpLedger::new(&LedgerConfig {
        base_url,
        timeout_seconds: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn list_instruments_preserves_ledger_order() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status":"success","data":[{"symbol":"ZEE","price":1},{"symbol":"ABB","price":2.5}]}"#,
    )
    .await;

    let instruments = ledger(url).list_instruments().await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /api/stocks "));
    let symbols: Vec<_> = instruments.iter().map(|i| i.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ZEE", "ABB"]);
    assert_eq!(instruments[1].price, dec!(2.5));
}

#[tokio::test]
async fn agent_detail_unwraps_nested_agent() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status":"success","data":{"agent":{"_id":"a7","name":"Val","persona":"Value investor","balance":5000,"portfolio":[]},"loans":[]}}"#,
    )
    .await;

    let agent = ledger(url).agent_detail("a7").await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /api/agents/a7 "));
    assert_eq!(agent.name, "Val");
    assert_eq!(agent.balance, dec!(5000));
}

#[tokio::test]
async fn agent_not_found_is_status_error() {
    let (url, server) = serve_once(
        "404 Not Found",
        r#"{"status":"fail","message":"Agent not found"}"#,
    )
    .await;

    let result = ledger(url).agent_detail("missing").await;
    server.await.unwrap();

    match result {
        Err(LedgerError::Status { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "Agent not found");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_trade_posts_to_action_endpoint() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status":"success","message":"Agent Val bought 4 shares of ABB.","data":{}}"#,
    )
    .await;

    let action = LedgerAction::Buy(TradeOrder {
        agent_id: "a7".to_string(),
        symbol: "ABB".to_string(),
        quantity: dec!(4),
    });
    ledger(url).submit_action(&action).await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /api/agents/buy "));
    assert!(request.contains(r#""agentId":"a7""#));
    assert!(request.contains(r#""symbol":"ABB""#));
}

#[tokio::test]
async fn rejected_trade_is_an_error() {
    let (url, server) = serve_once(
        "400 Bad Request",
        r#"{"status":"fail","message":"Insufficient balance."}"#,
    )
    .await;

    let action = LedgerAction::Sell(TradeOrder {
        agent_id: "a7".to_string(),
        symbol: "ABB".to_string(),
        quantity: dec!(400),
    });
    let result = ledger(url).submit_action(&action).await;
    server.await.unwrap();

    assert!(matches!(result, Err(LedgerError::Status { status: 400, .. })));
}

#[tokio::test]
async fn create_news_event_sends_snake_case_fields() {
    let (url, server) = serve_once(
        "201 Created",
        r#"{"status":"success","data":{"_id":"n1","headline":"Merger","content":"Two banks merge"}}"#,
    )
    .await;

    let event = ledger(url)
        .create_news_event("Merger", "Two banks merge")
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /api/news "));
    assert!(request.contains(r#""news_headline":"Merger""#));
    assert_eq!(event.id, "n1");
}

#[tokio::test]
async fn create_agent_returns_created_record() {
    let (url, server) = serve_once(
        "201 Created",
        r#"{"status":"success","message":"Agent created successfully.","data":{"_id":"a9","name":"Tiny","persona":"Contrarian","balance":100000,"portfolio":[]}}"#,
    )
    .await;

    let created = ledger(url)
        .create_agent(&NewAgent {
            name: "Tiny".to_string(),
            persona: "Contrarian".to_string(),
            model: "ollama/tinyllama".to_string(),
        })
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.contains(r#""model":"ollama/tinyllama""#));
    assert_eq!(created.id, "a9");
}

#[tokio::test]
async fn empty_roster_is_empty_list() {
    let (url, server) = serve_once("200 OK", r#"{"status":"success","data":[]}"#).await;

    let agents = ledger(url).list_agents().await.unwrap();
    server.await.unwrap();

    assert!(agents.is_empty());
}
