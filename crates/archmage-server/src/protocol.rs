//! Wire types shared by the HTTP routes and the WebSocket protocol.
//!
//! HTTP requests carry a [`RequestBody`] as their JSON body (an empty body is
//! the default). WebSocket text frames carry a [`WsMessage`], which is the
//! same body plus an `op` naming the route:
//!
//! ```json
//! {"op": "set_gesture", "session": "p1", "gesture": "FIST"}
//! ```

use archmage_types::{GestureLabel, Landmark, ManaLevel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Every operation the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    GetCommand,
    Tick,
    SetGesture,
    AddMana,
    SetTutorialMode,
    ResetCombo,
    ResetSpellStats,
    GetSpellStats,
    Schema,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::GetCommand,
        Route::Tick,
        Route::SetGesture,
        Route::AddMana,
        Route::SetTutorialMode,
        Route::ResetCombo,
        Route::ResetSpellStats,
        Route::GetSpellStats,
        Route::Schema,
    ];

    /// The op name, as sent in a WebSocket frame's `op`.
    pub fn name(&self) -> &'static str {
        match self {
            Route::GetCommand => "get_command",
            Route::Tick => "tick",
            Route::SetGesture => "set_gesture",
            Route::AddMana => "add_mana",
            Route::SetTutorialMode => "set_tutorial_mode",
            Route::ResetCombo => "reset_combo",
            Route::ResetSpellStats => "reset_spell_stats",
            Route::GetSpellStats => "get_spell_stats",
            Route::Schema => "schema",
        }
    }

    /// HTTP path the route is mounted on.
    pub fn path(&self) -> &'static str {
        match self {
            Route::GetCommand => "/get_command",
            Route::Tick => "/tick",
            Route::SetGesture => "/set_gesture",
            Route::AddMana => "/add_mana",
            Route::SetTutorialMode => "/set_tutorial_mode",
            Route::ResetCombo => "/reset_combo",
            Route::ResetSpellStats => "/reset_spell_stats",
            Route::GetSpellStats => "/get_spell_stats",
            Route::Schema => "/schema",
        }
    }

    pub fn from_op(op: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|r| r.name() == op)
    }
}

/// Request payload. Every field is optional; routes read what they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RequestBody {
    pub session: Option<String>,
    /// Gesture token; unknown tokens read as `NONE`.
    pub gesture: Option<String>,
    /// One camera frame of 21 landmarks. An empty list means no hand.
    pub landmarks: Option<Vec<Landmark>>,
    /// Signed mana credit.
    pub amount: Option<f32>,
    /// Tutorial (unlimited mana) toggle; defaults to on.
    pub enabled: Option<bool>,
}

impl RequestBody {
    pub fn gesture_label(&self) -> Option<GestureLabel> {
        self.gesture.as_deref().map(GestureLabel::from_token)
    }
}

/// `?session=` query parameter accepted by every HTTP route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsMessage {
    pub op: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

/// Acknowledgement for side-channel routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ack {
    pub status: String,
    pub session: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture: Option<GestureLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mana: Option<ManaLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutorial_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combo: Option<u32>,
}

impl Ack {
    pub fn ok(session: &str) -> Self {
        Self {
            status: "ok".to_string(),
            session: session.to_string(),
            gesture: None,
            mana: None,
            tutorial_mode: None,
            combo: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}
