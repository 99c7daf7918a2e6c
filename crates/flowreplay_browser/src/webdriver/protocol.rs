//! W3C WebDriver wire messages used by the replay client.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::LaunchOptions;

/// Envelope of every WebDriver response.
#[derive(Debug, Deserialize)]
pub struct Response {
    pub value: Value,
}

/// Error payload carried in `value` on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorValue {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub ready: bool,
}

/// `POST /session` body for Chrome.
pub fn new_session_request(options: &LaunchOptions) -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "pageLoadStrategy": "normal",
                "goog:chromeOptions": {
                    "args": options.chrome_args(),
                    "excludeSwitches": ["enable-automation"],
                    "useAutomationExtension": false,
                    "prefs": {
                        "profile.default_content_setting_values.notifications": 2,
                        "profile.default_content_settings.popups": 0
                    }
                }
            }
        }
    })
}

fn pointer_source(actions: Vec<Value>) -> Value {
    json!({
        "actions": [{
            "type": "pointer",
            "id": "replay-mouse",
            "parameters": { "pointerType": "mouse" },
            "actions": actions
        }]
    })
}

fn relative_move(delta: (i64, i64)) -> Value {
    json!({
        "type": "pointerMove",
        "duration": 0,
        "origin": "pointer",
        "x": delta.0,
        "y": delta.1
    })
}

/// Relative pointer move.
pub fn move_by(delta: (i64, i64)) -> Value {
    pointer_source(vec![relative_move(delta)])
}

/// Relative pointer move followed by a left-button press and release.
pub fn move_and_click(delta: (i64, i64)) -> Value {
    pointer_source(vec![
        relative_move(delta),
        json!({ "type": "pointerDown", "button": 0 }),
        json!({ "type": "pointerUp", "button": 0 }),
    ])
}

/// `POST /execute/sync` body.
pub fn script(source: &str, args: Vec<Value>) -> Value {
    json!({ "script": source, "args": args })
}

/// Dispatches DOM mouse events of the given types at `(arguments[0], arguments[1])`
/// on the element under that point.
pub const DISPATCH_MOUSE_EVENTS: &str = r#"
var x = arguments[0], y = arguments[1], types = arguments[2];
var element = document.elementFromPoint(x, y);
if (element) {
    types.forEach(function (type) {
        element.dispatchEvent(new MouseEvent(type, {
            view: window,
            bubbles: true,
            cancelable: true,
            clientX: x,
            clientY: y
        }));
    });
}
"#;

pub const PAGE_DIMENSIONS: &str = "return [document.documentElement.scrollWidth, document.documentElement.scrollHeight];";

pub const SCROLL_TO: &str = "window.scrollTo(0, arguments[0]);";
