//! Frame fixtures
//!
//! Server-to-client frames as raw JSON, shaped like the vendor sends them.

use serde_json::{json, Value};

/// Heartbeat interval that never fires within a test
pub const LONG_HEARTBEAT_MS: u64 = 41_250;

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_SESSION: &str = "session-abc";

/// op 10
pub fn hello(interval_ms: u64) -> Value {
    json!({"op": 10, "d": {"heartbeat_interval": interval_ms}})
}

/// op 0 with an arbitrary event
pub fn dispatch(event: &str, seq: u64, data: Value) -> Value {
    json!({"op": 0, "t": event, "s": seq, "d": data})
}

/// READY for user 1; `resume_url` is what the next connection should target
pub fn ready(seq: u64, resume_url: Option<&str>) -> Value {
    dispatch(
        "READY",
        seq,
        json!({
            "v": 10,
            "user": {"id": "1", "username": "cordis", "bot": true},
            "guilds": [],
            "session_id": TEST_SESSION,
            "resume_gateway_url": resume_url
        }),
    )
}

pub fn resumed(seq: u64) -> Value {
    dispatch("RESUMED", seq, Value::Null)
}

/// Guild owned by user 1 with text channels and an @everyone role
pub fn guild_create(seq: u64, guild_id: u64, channel_ids: &[u64]) -> Value {
    let channels: Vec<Value> = channel_ids
        .iter()
        .enumerate()
        .map(|(position, id)| {
            json!({
                "id": id.to_string(),
                "type": 0,
                "name": format!("channel-{id}"),
                "position": position
            })
        })
        .collect();

    dispatch(
        "GUILD_CREATE",
        seq,
        json!({
            "id": guild_id.to_string(),
            "name": "test guild",
            "owner_id": "1",
            "member_count": 1,
            "channels": channels,
            "roles": [
                {"id": guild_id.to_string(), "name": "@everyone", "permissions": "1024"}
            ],
            "members": [
                {"user": {"id": "1", "username": "cordis", "bot": true}, "roles": []}
            ]
        }),
    )
}

pub fn guild_delete(seq: u64, guild_id: u64) -> Value {
    dispatch("GUILD_DELETE", seq, json!({"id": guild_id.to_string()}))
}

/// op 7
pub fn reconnect() -> Value {
    json!({"op": 7, "d": null})
}

/// op 9
pub fn invalid_session(resumable: bool) -> Value {
    json!({"op": 9, "d": resumable})
}
