use std::{fmt, path::PathBuf, str::FromStr};

use crate::foundation::{
    core::{Canvas, Offset},
    error::{LayercompError, LayercompResult},
};

/// One unit of content composited onto the canvas.
///
/// The variant set is closed. Objects whose `type` matches neither known kind, or that carry no
/// `type` at all, deserialize as [`Layer::Unknown`] and are skipped by the compositor unless
/// strict kind checking is enabled.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type")]
pub enum Layer {
    /// Text stamped onto the canvas.
    #[serde(rename = "image/text")]
    Text(TextLayer),
    /// Raster image overlaid onto the canvas.
    #[serde(rename = "image/image")]
    Image(ImageLayer),
    /// Any other `type` tag, or none.
    Unknown,
}

impl Layer {
    /// Build an image layer at offset (0, 0).
    pub fn image(file: impl Into<String>) -> Self {
        Self::Image(ImageLayer {
            x: 0,
            y: 0,
            file: Some(file.into()),
        })
    }

    /// Build a text layer with default color and gravity.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextLayer::new(text))
    }

    /// Referenced file, for the kinds that carry one. Blank names count as absent.
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Image(l) => l.file.as_deref().filter(|f| !f.trim().is_empty()),
            Self::Text(_) | Self::Unknown => None,
        }
    }
}

impl<'de> serde::Deserialize<'de> for Layer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(D::Error::custom(format!(
                "expected a layer object, found {value}"
            )));
        }
        match value.get("type").and_then(serde_json::Value::as_str) {
            Some("image/text" | "text") => <TextLayer as serde::Deserialize>::deserialize(value)
                .map(Self::Text)
                .map_err(D::Error::custom),
            Some("image/image" | "image") => {
                <ImageLayer as serde::Deserialize>::deserialize(value)
                    .map(Self::Image)
                    .map_err(D::Error::custom)
            }
            _ => Ok(Self::Unknown),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub text: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, alias = "pointSize", skip_serializing_if = "Option::is_none")]
    pub pointsize: Option<PointSize>,
    #[serde(default)]
    pub gravity: Gravity,
}

impl TextLayer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            x: 0,
            y: 0,
            text: text.into(),
            color: default_color(),
            font: None,
            pointsize: None,
            gravity: Gravity::default(),
        }
    }

    pub fn offset(&self) -> Offset {
        Offset::new(self.x, self.y)
    }
}

fn default_color() -> String {
    "black".to_string()
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageLayer {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    /// Local path or remote URL. Absence is reported when the layer is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ImageLayer {
    pub fn offset(&self) -> Offset {
        Offset::new(self.x, self.y)
    }
}

/// Text size, either absolute points or a percentage of the canvas height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointSize {
    /// Used as given, fractions included.
    Points(f64),
    Percent(u32),
}

impl PointSize {
    /// Absolute point size for a canvas of `canvas_height` pixels.
    ///
    /// Percentages resolve to `floor(percent / 100 * canvas_height)`.
    pub fn resolve(self, canvas_height: u32) -> f64 {
        match self {
            Self::Points(p) => p,
            Self::Percent(pct) => (u64::from(pct) * u64::from(canvas_height) / 100) as f64,
        }
    }

    /// Resolved size as a renderer argument, or `None` when it is zero and the renderer's
    /// default should apply.
    pub fn to_arg(self, canvas_height: u32) -> Option<String> {
        let size = self.resolve(canvas_height);
        (size > 0.0).then(|| size.to_string())
    }
}

impl fmt::Display for PointSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Points(p) => write!(f, "{p}"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl FromStr for PointSize {
    type Err = LayercompError;

    fn from_str(s: &str) -> LayercompResult<Self> {
        let s = s.trim();
        if s.ends_with('%') {
            // Leading integer only: "50.5%" is 50 percent.
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            let pct = digits.parse::<u32>().map_err(|_| {
                LayercompError::validation(format!("invalid percentage point size '{s}'"))
            })?;
            return Ok(Self::Percent(pct));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(Self::Points(v)),
            _ => Err(LayercompError::validation(format!(
                "invalid point size '{s}'"
            ))),
        }
    }
}

impl serde::Serialize for PointSize {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Points(p) if p.fract() == 0.0 && *p <= f64::from(u32::MAX) => {
                serializer.serialize_u32(*p as u32)
            }
            Self::Points(p) => serializer.serialize_f64(*p),
            Self::Percent(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl<'de> serde::Deserialize<'de> for PointSize {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Str(String),
        }

        match <Raw as serde::Deserialize>::deserialize(deserializer)? {
            Raw::Num(v) if v.is_finite() && v >= 0.0 => Ok(Self::Points(v)),
            Raw::Num(v) => Err(serde::de::Error::custom(format!(
                "invalid point size {v}"
            ))),
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Anchor point used to position annotated text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gravity {
    #[default]
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
    /// ImageMagick's `none`: no anchoring.
    None,
    /// ImageMagick's `forget`: reset to the renderer default.
    Forget,
}

impl Gravity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NorthWest => "northwest",
            Self::North => "north",
            Self::NorthEast => "northeast",
            Self::West => "west",
            Self::Center => "center",
            Self::East => "east",
            Self::SouthWest => "southwest",
            Self::South => "south",
            Self::SouthEast => "southeast",
            Self::None => "none",
            Self::Forget => "forget",
        }
    }
}

impl FromStr for Gravity {
    type Err = LayercompError;

    fn from_str(s: &str) -> LayercompResult<Self> {
        let g = match s.trim().to_ascii_lowercase().as_str() {
            "northwest" => Self::NorthWest,
            "north" => Self::North,
            "northeast" => Self::NorthEast,
            "west" => Self::West,
            "center" => Self::Center,
            "east" => Self::East,
            "southwest" => Self::SouthWest,
            "south" => Self::South,
            "southeast" => Self::SouthEast,
            "none" => Self::None,
            "forget" => Self::Forget,
            other => {
                return Err(LayercompError::validation(format!(
                    "unknown gravity '{other}'"
                )));
            }
        };
        Ok(g)
    }
}

impl TryFrom<String> for Gravity {
    type Error = LayercompError;

    fn try_from(value: String) -> LayercompResult<Self> {
        value.parse()
    }
}

impl From<Gravity> for String {
    fn from(value: Gravity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-level knobs that shape the layer stack and canvas.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProcessingOptions {
    /// Explicit canvas width. Must be given together with `height`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Explicit canvas height. Must be given together with `width`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Base image prepended as the bottom-most image layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ProcessingOptions {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn validate(&self) -> LayercompResult<()> {
        match (self.width, self.height) {
            (Some(0), _) | (_, Some(0)) => Err(LayercompError::validation(
                "explicit canvas width/height must be > 0",
            )),
            (Some(_), None) | (None, Some(_)) => Err(LayercompError::validation(
                "canvas width and height must be given together",
            )),
            _ => Ok(()),
        }
    }

    /// Explicit size when both dimensions are present.
    pub fn explicit_canvas(&self) -> Option<Canvas> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(Canvas::new(w, h)),
            _ => None,
        }
    }

    /// The stack actually processed: `source` (if any) followed by `layers`.
    pub fn effective_layers(&self, layers: Vec<Layer>) -> Vec<Layer> {
        match &self.source {
            Some(source) => {
                let mut out = Vec::with_capacity(layers.len() + 1);
                out.push(Layer::image(source.clone()));
                out.extend(layers);
                out
            }
            None => layers,
        }
    }
}

/// A layer whose image source, if any, is a local filesystem path.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedLayer {
    Text(TextLayer),
    Image(ResolvedImage),
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedImage {
    pub offset: Offset,
    pub file: Option<PathBuf>,
}

impl ResolvedLayer {
    pub fn image_file(&self) -> Option<&std::path::Path> {
        match self {
            Self::Image(img) => img.file.as_deref(),
            Self::Text(_) | Self::Unknown => None,
        }
    }
}

/// Parse a layer stack from JSON. A single layer object is a one-element stack.
pub fn parse_layers(json: &str) -> LayercompResult<Vec<Layer>> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| LayercompError::serde(e.to_string()))?;
    layers_from_value(value)
}

/// Reader variant of [`parse_layers`].
pub fn read_layers<R: std::io::Read>(reader: R) -> LayercompResult<Vec<Layer>> {
    let value: serde_json::Value =
        serde_json::from_reader(reader).map_err(|e| LayercompError::serde(e.to_string()))?;
    layers_from_value(value)
}

fn layers_from_value(value: serde_json::Value) -> LayercompResult<Vec<Layer>> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item)
                    .map_err(|e| LayercompError::serde(format!("layer {index}: {e}")))
            })
            .collect(),
        single => {
            let layer =
                serde_json::from_value(single).map_err(|e| LayercompError::serde(e.to_string()))?;
            Ok(vec![layer])
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/model.rs"]
mod tests;
