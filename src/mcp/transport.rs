//! Newline-delimited JSON-RPC over standard input/output
//!
//! Requests are handled one at a time in arrival order; each response is
//! written and flushed before the next line is read. Resource notifications
//! raised while handling a request follow its response.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::{error::TryRecvError, Receiver};
use tracing::{info, warn};

use crate::mcp::rpc::{json_rpc_error, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

pub async fn serve_stdio(state: &AppState) -> std::io::Result<()> {
    serve(state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

pub async fn serve<R, W>(state: &AppState, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut notifications = state.events.listen();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        let message = line.trim_ascii();
        if message.is_empty() {
            continue;
        }

        let response = match serde_json::from_slice::<Value>(message) {
            Ok(payload) => handle_json_rpc_payload(state, payload).await,
            Err(err) => {
                warn!(error = %err, "discarding unparseable message");
                Some(json_rpc_error(None, PARSE_ERROR, "Parse error"))
            }
        };

        if let Some(response) = response {
            write_message(&mut writer, &response).await?;
        }
        forward_notifications(&mut notifications, &mut writer).await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

async fn forward_notifications<W>(
    notifications: &mut Receiver<Value>,
    writer: &mut W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        match notifications.try_recv() {
            Ok(notification) => write_message(writer, &notification).await?,
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "resource notifications dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}

async fn write_message<W>(writer: &mut W, message: &Value) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec(message)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use tokio::io::BufReader;

    use super::serve;
    use crate::{build_state, config::Config, AppState};

    fn state(dir: &tempfile::TempDir) -> AppState {
        build_state(&Config {
            docs_root: dir.path().to_path_buf(),
            readme_file: "README.md".to_string(),
        })
        .expect("state should build")
    }

    async fn run(state: &AppState, input: &str) -> Vec<Value> {
        run_bytes(state, input.as_bytes()).await
    }

    async fn run_bytes(state: &AppState, input: &[u8]) -> Vec<Value> {
        let mut output = Vec::new();
        serve(state, BufReader::new(input), &mut output)
            .await
            .expect("serve loop");

        String::from_utf8(output)
            .expect("utf-8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn answers_each_request_line_in_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/read","params":{"uri":"users://3"}}"#,
            "\n",
        );

        let responses = run(&state, input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert!(responses[0]["result"].is_object());
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["contents"][0]["uri"], "users://3");
    }

    #[tokio::test]
    async fn unparseable_line_gets_parse_error_and_loop_continues() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);
        let input = "{not json\n{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n";

        let responses = run(&state, input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1]["id"], 9);
    }

    #[tokio::test]
    async fn stops_cleanly_at_end_of_input() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);

        assert!(run(&state, "").await.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_line_gets_parse_error_and_loop_continues() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"ping","x":""#.to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\"}\n");
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let responses = run_bytes(&state, &input).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["id"], 2);
        assert!(responses[2]["result"].is_object());
    }

    #[tokio::test]
    async fn last_line_without_newline_is_answered() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);

        let responses = run(&state, r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 4);
    }

    #[tokio::test]
    async fn subscribed_collection_update_follows_tool_response() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/subscribe","params":{"uri":"data://users"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"create_user","arguments":{"name":"Dana","email":"dana@example.com"}}}"#,
            "\n",
        );

        let responses = run(&state, input).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[2]["method"], "notifications/resources/updated");
        assert_eq!(responses[2]["params"]["uri"], "data://users");
        assert!(responses[2].get("id").is_none());
    }
}
