//! Player endpoint response unwrapping.
//!
//! `/film/{id}/player` answers an XHR with a JSON envelope whose `snippets`
//! map holds HTML fragments keyed by the DOM id they replace. The player
//! markup lives under `#film-player-container`. Older responses returned a
//! bare config object or plain HTML; all three shapes end up as HTML text
//! the resolver can scan.

use serde_json::Value;

/// Snippet key holding the player markup.
pub const PLAYER_SNIPPET: &str = "#film-player-container";

/// Convert a player endpoint body into HTML for the resolver.
pub fn unwrap_player_response(body: &str) -> String {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return body.to_string();
    }

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        tracing::debug!("Player body looks like JSON but does not parse; scanning as text");
        return body.to_string();
    };

    if let Some(Value::Object(snippets)) = map.get("snippets") {
        let mut html = String::new();
        if let Some(Value::String(player)) = snippets.get(PLAYER_SNIPPET) {
            html.push_str(player);
        }
        for (key, value) in snippets {
            if key == PLAYER_SNIPPET {
                continue;
            }
            if let Value::String(fragment) = value {
                html.push('\n');
                html.push_str(fragment);
            }
        }
        if !html.trim().is_empty() {
            return html;
        }
    }

    if ["sources", "stream", "url", "file"].iter().any(|k| map.contains_key(*k)) {
        let config = Value::Object(map).to_string();
        return format!("<script>playerConfig = {config};</script>");
    }

    body.to_string()
}
