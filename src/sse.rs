use serde::Serialize;
use warp::sse::Event;

/// One client-facing frame, serialized as the `data:` payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayFrame {
    /// Answer text delta
    Text { text: String },
    /// Reasoning delta; `timestamp` is seconds since the relay started
    Thinking { thinking: String, timestamp: f64 },
    /// Terminal frame sent when the upstream call fails
    Error { message: String },
}

impl RelayFrame {
    /// Thinking frame with the timestamp rounded to two decimals
    pub fn thinking(thinking: String, elapsed_secs: f64) -> Self {
        RelayFrame::Thinking {
            thinking,
            timestamp: (elapsed_secs * 100.0).round() / 100.0,
        }
    }

    /// JSON payload carried by the frame
    pub fn to_json(&self) -> String {
        // Only strings and a finite f64 are serialized, which cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Render a frame as an unnamed SSE event, `data: <json>\n\n` on the wire
pub fn frame_event(frame: &RelayFrame) -> Result<Event, std::convert::Infallible> {
    // warp writes `data:` with no separator; the payload carries the space
    Ok(Event::default().data(format!(" {}", frame.to_json())))
}
