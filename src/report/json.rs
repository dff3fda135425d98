use serde::Serialize;

use crate::pipeline::executor::StreamEvent;

pub const SSE_DONE: &str = "data: [DONE]";

pub fn render_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// One server-sent-events line. The terminal event becomes `data: [DONE]`.
pub fn render_sse_line(event: &StreamEvent) -> Result<String, serde_json::Error> {
    match event {
        StreamEvent::Done => Ok(SSE_DONE.to_string()),
        other => Ok(format!("data: {}", serde_json::to_string(other)?)),
    }
}
