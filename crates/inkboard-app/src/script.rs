//! Scripted input replay.
//!
//! A script is a JSON array of steps fed to the engine in order, the same
//! way a host would forward UI events:
//!
//! ```json
//! [
//!   { "action": "tool", "tool": "rectangle" },
//!   { "action": "pointer", "event": "down", "position": { "x": 10, "y": 10 } },
//!   { "action": "pointer", "event": "up", "position": { "x": 80, "y": 60 } },
//!   { "action": "key", "key": { "char": "z" }, "modifiers": { "ctrl": true } }
//! ]
//! ```

use inkboard_core::{Engine, KeyEvent, KeyOutcome, PointerEvent, ResizeHandle, TextOutcome, ToolKind, ToolSettings};
use kurbo::{Point, Size};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One scripted input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ScriptStep {
    Tool { tool: ToolKind },
    Settings(ToolSettings),
    Viewport { width: f64, height: f64 },
    Pointer(PointerEvent),
    Key(KeyEvent),
    /// Commit (or, with `shift`, continue) the pending text box.
    Text {
        text: String,
        #[serde(default)]
        shift: bool,
    },
    /// Blur the text overlay with its current contents.
    Blur { text: String },
    /// Start resizing the single selected element from a handle.
    Resize { handle: ResizeHandle },
    Place {
        component_type: String,
        width: f64,
        height: f64,
        #[serde(default)]
        at: Option<Point>,
        #[serde(default)]
        props: Map<String, Value>,
    },
    SelectAll,
    BringToFront,
    SendToBack,
    ZoomToFit,
}

/// What a replay did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub steps: usize,
    /// Steps the engine rejected or ignored.
    pub ignored: usize,
    /// A save shortcut was pressed during the script.
    pub save_requested: bool,
}

/// Parse a script file's contents.
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Feed every step to the engine.
pub fn replay(engine: &mut Engine, steps: &[ScriptStep]) -> ReplayReport {
    let mut report = ReplayReport::default();
    for step in steps {
        report.steps += 1;
        let accepted = apply_step(engine, step, &mut report);
        if !accepted {
            log::debug!("step {} ignored: {step:?}", report.steps);
            report.ignored += 1;
        }
    }
    report
}

fn apply_step(engine: &mut Engine, step: &ScriptStep, report: &mut ReplayReport) -> bool {
    match step {
        ScriptStep::Tool { tool } => engine.set_tool(*tool),
        ScriptStep::Settings(settings) => *engine.settings_mut() = *settings,
        ScriptStep::Viewport { width, height } => engine.set_viewport(Size::new(*width, *height)),
        ScriptStep::Pointer(PointerEvent::Down { position, button, modifiers }) => {
            return engine.pointer_down(*position, *button, *modifiers);
        }
        ScriptStep::Pointer(event) => engine.handle_pointer(*event),
        ScriptStep::Key(event) => match engine.handle_key(*event, false) {
            KeyOutcome::Handled => {}
            KeyOutcome::SaveRequested => report.save_requested = true,
            KeyOutcome::Ignored => return false,
        },
        ScriptStep::Text { text, shift } => {
            return !matches!(engine.submit_text(text, *shift), TextOutcome::Inactive);
        }
        ScriptStep::Blur { text } => return !matches!(engine.blur_text(text), TextOutcome::Inactive),
        ScriptStep::Resize { handle } => {
            return match engine.selection().single() {
                Some(id) => engine.begin_resize(id, *handle),
                None => false,
            };
        }
        ScriptStep::Place { component_type, width, height, at, props } => {
            let size = Size::new(*width, *height);
            return engine.place_component(component_type, size, props.clone(), *at).is_some();
        }
        ScriptStep::SelectAll => engine.select_all(),
        ScriptStep::BringToFront => return engine.bring_to_front(),
        ScriptStep::SendToBack => return engine.send_to_back(),
        ScriptStep::ZoomToFit => engine.zoom_to_fit(),
    }
    true
}
