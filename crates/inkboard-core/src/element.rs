//! Board elements and their payloads.
//!
//! Elements are persisted with a free-form `data` object. In memory the
//! payload is an explicit tagged enum; conversion goes through
//! [`RawElement`] so documents written without a `kind` discriminator still
//! load (the kind is inferred from which fields are present). Data that
//! cannot be read at all becomes [`Payload::Invalid`], which keeps the raw
//! value for the next save and is never drawn or hit.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// RGBA8 color, persisted as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::new(nibble(0)?, nibble(1)?, nibble(2)?, 255))
            }
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

impl From<peniko::Color> for Color {
    fn from(color: peniko::Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Color> for peniko::Color {
    fn from(color: Color) -> Self {
        peniko::Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Top-level element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Freehand strokes, shapes and text.
    Drawing,
    /// Opaque widget placed from a template (sticky note, checklist...).
    Component,
}

/// Geometric shape variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Square,
    Rectangle,
    Circle,
    Arrow,
}

/// Freehand stroke; points are relative to the element origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingPayload {
    pub points: Vec<Point>,
    pub color: Color,
    pub thickness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapePayload {
    pub shape_type: ShapeType,
    pub color: Color,
    pub thickness: f64,
    /// Arrow endpoint relative to the element origin. Zero for other shapes.
    pub end: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextPayload {
    pub text: String,
    pub color: Color,
    pub font_size: f64,
}

/// Component widgets carry host-defined props untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentPayload {
    pub props: Map<String, Value>,
}

/// Persisted `data` that could not be read, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidPayload {
    pub data: Value,
    pub reason: String,
}

/// Discriminated element payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Drawing(DrawingPayload),
    Shape(ShapePayload),
    Text(TextPayload),
    Component(ComponentPayload),
    Invalid(InvalidPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PayloadKind {
    Drawing,
    Shape,
    Text,
}

/// Why a persisted payload could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("payload has none of `points`, `shapeType` or `text`")]
    Unrecognized,
    #[error("payload matches more than one kind")]
    Ambiguous,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("{0}")]
    Malformed(String),
}

pub const DEFAULT_THICKNESS: f64 = 2.0;
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Wire form of a non-component payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<PayloadKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape_type: Option<ShapeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y2: Option<f64>,
}

impl RawPayload {
    fn infer_kind(&self) -> Result<PayloadKind, PayloadError> {
        if let Some(kind) = self.kind {
            return Ok(kind);
        }
        let present = [
            (self.points.is_some(), PayloadKind::Drawing),
            (self.shape_type.is_some(), PayloadKind::Shape),
            (self.text.is_some(), PayloadKind::Text),
        ];
        let mut found = present.iter().filter(|(has, _)| *has).map(|(_, kind)| *kind);
        match (found.next(), found.next()) {
            (Some(kind), None) => Ok(kind),
            (Some(_), Some(_)) => Err(PayloadError::Ambiguous),
            (None, _) => Err(PayloadError::Unrecognized),
        }
    }
}

impl TryFrom<RawPayload> for Payload {
    type Error = PayloadError;

    fn try_from(raw: RawPayload) -> Result<Self, Self::Error> {
        let color = raw.color.unwrap_or_default();
        let thickness = raw.thickness.unwrap_or(DEFAULT_THICKNESS);
        Ok(match raw.infer_kind()? {
            PayloadKind::Drawing => Payload::Drawing(DrawingPayload {
                points: raw.points.ok_or(PayloadError::MissingField("points"))?,
                color,
                thickness,
            }),
            PayloadKind::Shape => {
                let shape_type = raw.shape_type.ok_or(PayloadError::MissingField("shapeType"))?;
                Payload::Shape(ShapePayload {
                    shape_type,
                    color,
                    thickness,
                    end: Vec2::new(raw.x2.unwrap_or(0.0), raw.y2.unwrap_or(0.0)),
                })
            }
            PayloadKind::Text => Payload::Text(TextPayload {
                text: raw.text.ok_or(PayloadError::MissingField("text"))?,
                color,
                font_size: raw.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            }),
        })
    }
}

impl Payload {
    /// Build a payload from persisted `data`.
    pub fn from_value(kind: ElementKind, value: Value) -> Result<Self, PayloadError> {
        match kind {
            ElementKind::Component => match value {
                Value::Object(props) => Ok(Payload::Component(ComponentPayload { props })),
                Value::Null => Ok(Payload::Component(ComponentPayload::default())),
                other => Err(PayloadError::Malformed(format!(
                    "component data must be an object, got {other}"
                ))),
            },
            ElementKind::Drawing => {
                let raw: RawPayload =
                    serde_json::from_value(value).map_err(|e| PayloadError::Malformed(e.to_string()))?;
                Payload::try_from(raw)
            }
        }
    }

    /// Like [`Payload::from_value`], but unreadable data degrades to
    /// [`Payload::Invalid`] instead of failing.
    pub fn from_value_lossy(kind: ElementKind, value: Value) -> Self {
        match Self::from_value(kind, value.clone()) {
            Ok(payload) => payload,
            Err(e) => Payload::Invalid(InvalidPayload { data: value, reason: e.to_string() }),
        }
    }

    /// Persisted `data` for this payload.
    pub fn to_value(&self) -> Value {
        let raw = match self {
            Payload::Component(c) => return Value::Object(c.props.clone()),
            Payload::Invalid(i) => return i.data.clone(),
            Payload::Drawing(d) => RawPayload {
                kind: Some(PayloadKind::Drawing),
                points: Some(d.points.clone()),
                color: Some(d.color),
                thickness: Some(d.thickness),
                ..Default::default()
            },
            Payload::Shape(s) => {
                let arrow = s.shape_type == ShapeType::Arrow;
                RawPayload {
                    kind: Some(PayloadKind::Shape),
                    shape_type: Some(s.shape_type),
                    color: Some(s.color),
                    thickness: Some(s.thickness),
                    x2: arrow.then_some(s.end.x),
                    y2: arrow.then_some(s.end.y),
                    ..Default::default()
                }
            }
            Payload::Text(t) => RawPayload {
                kind: Some(PayloadKind::Text),
                text: Some(t.text.clone()),
                color: Some(t.color),
                font_size: Some(t.font_size),
                ..Default::default()
            },
        };
        serde_json::to_value(raw).unwrap_or(Value::Null)
    }

    /// Stroke thickness for stroked payloads.
    pub fn thickness(&self) -> Option<f64> {
        match self {
            Payload::Drawing(d) => Some(d.thickness),
            Payload::Shape(s) => Some(s.thickness),
            _ => None,
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            Payload::Drawing(d) => Some(d.color),
            Payload::Shape(s) => Some(s.color),
            Payload::Text(t) => Some(t.color),
            Payload::Component(_) | Payload::Invalid(_) => None,
        }
    }
}

/// A drawable unit on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawElement", into = "RawElement")]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub component_type: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub z_index: i64,
    pub payload: Payload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    id: ElementId,
    #[serde(rename = "type")]
    kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component_type: Option<String>,
    x: f64,
    y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    #[serde(default)]
    z_index: i64,
    #[serde(default)]
    data: Value,
}

impl From<RawElement> for Element {
    fn from(raw: RawElement) -> Self {
        Self {
            payload: Payload::from_value_lossy(raw.kind, raw.data),
            id: raw.id,
            kind: raw.kind,
            component_type: raw.component_type,
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
            z_index: raw.z_index,
        }
    }
}

impl From<Element> for RawElement {
    fn from(element: Element) -> Self {
        Self {
            data: element.payload.to_value(),
            id: element.id,
            kind: element.kind,
            component_type: element.component_type,
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
            z_index: element.z_index,
        }
    }
}

impl Element {
    /// Create a drawing element with a fresh id.
    pub fn drawing(origin: Point, z_index: i64, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ElementKind::Drawing,
            component_type: None,
            x: origin.x,
            y: origin.y,
            width: None,
            height: None,
            z_index,
            payload,
        }
    }

    /// Create a component element with a fresh id.
    pub fn component(
        component_type: impl Into<String>,
        origin: Point,
        size: kurbo::Size,
        z_index: i64,
        props: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ElementKind::Component,
            component_type: Some(component_type.into()),
            x: origin.x,
            y: origin.y,
            width: Some(size.width),
            height: Some(size.height),
            z_index,
            payload: Payload::Component(ComponentPayload { props }),
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.x = origin.x;
        self.y = origin.y;
    }

    pub fn size(&self) -> kurbo::Size {
        kurbo::Size::new(self.width.unwrap_or(0.0), self.height.unwrap_or(0.0))
    }

    pub fn shape_type(&self) -> Option<ShapeType> {
        match &self.payload {
            Payload::Shape(s) => Some(s.shape_type),
            _ => None,
        }
    }

    /// Why the payload could not be read, if it could not.
    pub fn invalid_reason(&self) -> Option<&str> {
        match &self.payload {
            Payload::Invalid(i) => Some(&i.reason),
            _ => None,
        }
    }

    /// Whether every coordinate this element carries is finite.
    pub fn is_finite(&self) -> bool {
        let opt = |v: Option<f64>| v.is_none_or(f64::is_finite);
        let base = self.x.is_finite() && self.y.is_finite() && opt(self.width) && opt(self.height);
        base && match &self.payload {
            Payload::Drawing(d) => {
                d.thickness.is_finite() && d.points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
            }
            Payload::Shape(s) => s.thickness.is_finite() && s.end.x.is_finite() && s.end.y.is_finite(),
            Payload::Text(t) => t.font_size.is_finite(),
            Payload::Component(_) | Payload::Invalid(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_color_hex_roundtrip() {
        let c = Color::from_hex("#1e90ff").unwrap();
        assert_eq!(c, Color::new(0x1e, 0x90, 0xff, 255));
        assert_eq!(c.to_hex(), "#1e90ff");
        assert_eq!(Color::from_hex("#fff"), Some(Color::white()));
        assert_eq!(Color::from_hex("#00000080").unwrap().a, 0x80);
        assert!(Color::from_hex("red").is_none());
    }

    #[test]
    fn test_legacy_drawing_without_kind() {
        let value = json!({
            "id": "6f1c4b2e-8f0a-4d7e-9a4b-2f4e1c0d9b11",
            "type": "drawing",
            "x": 10.0,
            "y": 20.0,
            "zIndex": 3,
            "data": { "points": [{"x": 0.0, "y": 0.0}, {"x": 5.0, "y": 5.0}], "color": "#ff0000", "thickness": 4.0 }
        });
        let element: Element = serde_json::from_value(value).unwrap();
        match &element.payload {
            Payload::Drawing(d) => {
                assert_eq!(d.points.len(), 2);
                assert_eq!(d.color, Color::new(255, 0, 0, 255));
            }
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(element.z_index, 3);
    }

    #[test]
    fn test_arrow_keeps_endpoint() {
        let value = json!({
            "id": "6f1c4b2e-8f0a-4d7e-9a4b-2f4e1c0d9b12",
            "type": "drawing",
            "x": 0.0,
            "y": 0.0,
            "data": { "shapeType": "arrow", "color": "#000000", "thickness": 2.0, "x2": 30.0, "y2": -5.0 }
        });
        let element: Element = serde_json::from_value(value).unwrap();
        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["data"]["kind"], "shape");
        assert_eq!(back["data"]["x2"], 30.0);
        assert_eq!(back["data"]["y2"], -5.0);
    }

    #[test]
    fn test_ambiguous_payload_rejected() {
        let raw = RawPayload {
            points: Some(vec![]),
            text: Some("hi".into()),
            ..Default::default()
        };
        assert_eq!(Payload::try_from(raw), Err(PayloadError::Ambiguous));
    }

    #[test]
    fn test_explicit_kind_requires_field() {
        let raw = RawPayload {
            kind: Some(PayloadKind::Text),
            ..Default::default()
        };
        assert_eq!(Payload::try_from(raw), Err(PayloadError::MissingField("text")));
    }

    #[test]
    fn test_component_props_are_opaque() {
        let value = json!({
            "id": "6f1c4b2e-8f0a-4d7e-9a4b-2f4e1c0d9b13",
            "type": "component",
            "componentType": "sticky-note",
            "x": 0.0,
            "y": 0.0,
            "width": 200.0,
            "height": 150.0,
            "data": { "text": "remember", "color": "yellow" }
        });
        let element: Element = serde_json::from_value(value.clone()).unwrap();
        assert!(matches!(element.payload, Payload::Component(_)));
        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["data"], value["data"]);
    }

    #[test]
    fn test_unreadable_data_is_kept_verbatim() {
        let value = json!({
            "id": "6f1c4b2e-8f0a-4d7e-9a4b-2f4e1c0d9b14",
            "type": "drawing",
            "x": 4.0,
            "y": 5.0,
            "zIndex": 2,
            "data": { "points": "not a list", "color": "#ff0000" }
        });
        let element: Element = serde_json::from_value(value.clone()).unwrap();
        assert!(element.invalid_reason().is_some());
        assert_eq!(element.origin(), Point::new(4.0, 5.0));
        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["data"], value["data"]);
        assert_eq!(back["zIndex"], 2);
    }

    #[test]
    fn test_missing_envelope_field_fails() {
        let value = json!({ "type": "drawing", "x": 0.0, "y": 0.0, "data": { "text": "x" } });
        assert!(serde_json::from_value::<Element>(value).is_err());
    }

    #[test]
    fn test_non_finite_detected() {
        let mut element = Element::drawing(
            Point::ZERO,
            0,
            Payload::Text(TextPayload { text: "x".into(), color: Color::black(), font_size: 16.0 }),
        );
        assert!(element.is_finite());
        element.x = f64::NAN;
        assert!(!element.is_finite());
    }
}
