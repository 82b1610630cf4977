//! Synced fields shared between the host and the renderer.
//!
//! Every synced field has a fixed wire name and a [`FieldKind`]; its runtime
//! value is a [`FieldValue`], where [`FieldValue::Null`] means "unset, let
//! the renderer use its default". [`WidgetConfig`] declares the full
//! configuration catalogue understood by the renderer.

use std::path::Path;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// A colour given either by name (`"#ff0000"`, `"red"`) or as RGBA
/// components in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "ColorRepr")]
pub enum Color {
    /// CSS colour string.
    Named(String),
    /// Red, green, blue, alpha.
    Rgba(f64, f64, f64, f64),
}

impl Color {
    /// Builds an RGBA colour from 3 or 4 components. Alpha defaults to 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for any other component count.
    pub fn from_components(components: &[f64]) -> Result<Self> {
        match *components {
            [r, g, b] => Ok(Self::Rgba(r, g, b, 1.0)),
            [r, g, b, a] => Ok(Self::Rgba(r, g, b, a)),
            _ => Err(Error::invalid_config(format!(
                "a colour needs 3 or 4 components, got {}",
                components.len()
            ))),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Named(name) => Value::String(name.clone()),
            Self::Rgba(r, g, b, a) => json!([r, g, b, a]),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Named(String),
    Components(Vec<f64>),
}

impl TryFrom<ColorRepr> for Color {
    type Error = Error;

    fn try_from(repr: ColorRepr) -> Result<Self> {
        match repr {
            ColorRepr::Named(name) => Ok(Self::Named(name)),
            ColorRepr::Components(components) => Self::from_components(&components),
        }
    }
}

impl From<Color> for ColorRepr {
    fn from(color: Color) -> Self {
        match color {
            Color::Named(name) => Self::Named(name),
            Color::Rgba(r, g, b, a) => Self::Components(vec![r, g, b, a]),
        }
    }
}

/// Random seed for the simulation: a number or a string hashed by the
/// renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    /// Numeric seed.
    Int(i64),
    /// String seed.
    Name(String),
}

/// Identifier of a graph node as reported by the renderer: the value of the
/// point id column, which may be numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    /// Numeric id.
    Index(i64),
    /// String id.
    Name(String),
}

/// Kind of a synced field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Boolean.
    Bool,
    /// Float.
    Float,
    /// Integer.
    Int,
    /// String.
    String,
    /// String or RGBA tuple.
    Color,
    /// Integer or string.
    Seed,
    /// List of floats.
    FloatList,
    /// List of integers.
    IntList,
    /// List of strings.
    StringList,
    /// List of lists of floats.
    FloatMatrix,
    /// List of node ids.
    IdList,
    /// Binary buffer.
    Bytes,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bool => "boolean",
            Self::Float => "float",
            Self::Int => "integer",
            Self::String => "string",
            Self::Color => "colour",
            Self::Seed => "integer or string",
            Self::FloatList => "list of floats",
            Self::IntList => "list of integers",
            Self::StringList => "list of strings",
            Self::FloatMatrix => "list of lists of floats",
            Self::IdList => "list of node ids",
            Self::Bytes => "byte buffer",
        };
        f.write_str(name)
    }
}

/// Runtime value of a synced field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Unset.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Float.
    Float(f64),
    /// Integer.
    Int(i64),
    /// String.
    String(String),
    /// Colour.
    Color(Color),
    /// Seed.
    Seed(Seed),
    /// List of floats.
    FloatList(Vec<f64>),
    /// List of integers.
    IntList(Vec<i64>),
    /// List of strings.
    StringList(Vec<String>),
    /// List of lists of floats.
    FloatMatrix(Vec<Vec<f64>>),
    /// List of node ids.
    IdList(Vec<NodeId>),
    /// Binary buffer, sent out of band.
    Bytes(Bytes),
}

impl FieldValue {
    /// Kind of the value, `None` for [`FieldValue::Null`].
    pub fn kind(&self) -> Option<FieldKind> {
        let kind = match self {
            Self::Null => return None,
            Self::Bool(_) => FieldKind::Bool,
            Self::Float(_) => FieldKind::Float,
            Self::Int(_) => FieldKind::Int,
            Self::String(_) => FieldKind::String,
            Self::Color(_) => FieldKind::Color,
            Self::Seed(_) => FieldKind::Seed,
            Self::FloatList(_) => FieldKind::FloatList,
            Self::IntList(_) => FieldKind::IntList,
            Self::StringList(_) => FieldKind::StringList,
            Self::FloatMatrix(_) => FieldKind::FloatMatrix,
            Self::IdList(_) => FieldKind::IdList,
            Self::Bytes(_) => FieldKind::Bytes,
        };
        Some(kind)
    }

    /// Returns true for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts the value to the kind declared for field `name`.
    ///
    /// Lossless widenings are accepted (integer to float, string or integer
    /// to seed, string or 3/4 floats to colour, integer list to float list).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the value cannot represent `kind`.
    #[allow(clippy::cast_precision_loss)]
    pub fn coerce(self, name: &str, kind: FieldKind) -> Result<Self> {
        let coerced = match (self, kind) {
            (Self::Null, _) => Self::Null,
            (value, k) if value.kind() == Some(k) => value,
            (Self::Int(i), FieldKind::Float) => Self::Float(i as f64),
            (Self::Int(i), FieldKind::Seed) => Self::Seed(Seed::Int(i)),
            (Self::String(s), FieldKind::Seed) => Self::Seed(Seed::Name(s)),
            (Self::String(s), FieldKind::Color) => Self::Color(Color::Named(s)),
            (Self::FloatList(v), FieldKind::Color) => Self::Color(Color::from_components(&v)?),
            (Self::IntList(v), FieldKind::FloatList) => {
                Self::FloatList(v.into_iter().map(|i| i as f64).collect())
            }
            (value, k) => {
                return Err(Error::invalid_config(format!(
                    "field '{}' expects {}, got {}",
                    name,
                    k,
                    value.kind().map_or_else(|| "null".to_string(), |k| k.to_string())
                )))
            }
        };
        Ok(coerced)
    }

    /// Parses a JSON value as a field of the given kind. JSON `null` is
    /// [`FieldValue::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the JSON does not match `kind`.
    pub fn from_json(name: &str, kind: FieldKind, value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::Null);
        }

        let mismatch = || {
            Error::invalid_config(format!(
                "field '{}' expects {}, got {}",
                name, kind, value
            ))
        };

        let parsed = match kind {
            FieldKind::Bool => Self::Bool(value.as_bool().ok_or_else(mismatch)?),
            FieldKind::Float => Self::Float(value.as_f64().ok_or_else(mismatch)?),
            FieldKind::Int => Self::Int(value.as_i64().ok_or_else(mismatch)?),
            FieldKind::String => Self::String(value.as_str().ok_or_else(mismatch)?.to_string()),
            FieldKind::Color => Self::Color(parse_typed(value).ok_or_else(mismatch)?),
            FieldKind::Seed => Self::Seed(parse_typed(value).ok_or_else(mismatch)?),
            FieldKind::FloatList => Self::FloatList(parse_typed(value).ok_or_else(mismatch)?),
            FieldKind::IntList => Self::IntList(parse_typed(value).ok_or_else(mismatch)?),
            FieldKind::StringList => Self::StringList(parse_typed(value).ok_or_else(mismatch)?),
            FieldKind::FloatMatrix => {
                Self::FloatMatrix(parse_typed(value).ok_or_else(mismatch)?)
            }
            FieldKind::IdList => Self::IdList(parse_typed(value).ok_or_else(mismatch)?),
            FieldKind::Bytes => return Err(mismatch()),
        };
        Ok(parsed)
    }

    /// JSON form of the value. Byte buffers become `null`; they travel
    /// outside the JSON payload.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null | Self::Bytes(_) => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Float(f) => json!(f),
            Self::Int(i) => json!(i),
            Self::String(s) => Value::String(s.clone()),
            Self::Color(c) => c.to_json(),
            Self::Seed(Seed::Int(i)) => json!(i),
            Self::Seed(Seed::Name(s)) => Value::String(s.clone()),
            Self::FloatList(v) => json!(v),
            Self::IntList(v) => json!(v),
            Self::StringList(v) => json!(v),
            Self::FloatMatrix(v) => json!(v),
            Self::IdList(v) => json!(v),
        }
    }
}

fn parse_typed<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

/// A Rust type that can back a synced field.
pub trait SyncedType: Sized {
    /// Kind of fields of this type.
    const KIND: FieldKind;

    /// Wraps the value.
    fn into_field(self) -> FieldValue;

    /// Unwraps a value already coerced to [`Self::KIND`].
    fn from_field(value: FieldValue) -> Option<Self>;
}

macro_rules! impl_synced_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl SyncedType for $ty {
                const KIND: FieldKind = FieldKind::$kind;

                fn into_field(self) -> FieldValue {
                    FieldValue::$kind(self)
                }

                fn from_field(value: FieldValue) -> Option<Self> {
                    match value {
                        FieldValue::$kind(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    value.into_field()
                }
            }

            impl From<Option<$ty>> for FieldValue {
                fn from(value: Option<$ty>) -> Self {
                    value.map_or(FieldValue::Null, SyncedType::into_field)
                }
            }
        )*
    };
}

impl_synced_type! {
    bool => Bool,
    f64 => Float,
    i64 => Int,
    String => String,
    Color => Color,
    Seed => Seed,
    Vec<f64> => FloatList,
    Vec<i64> => IntList,
    Vec<String> => StringList,
    Vec<Vec<f64>> => FloatMatrix,
    Vec<NodeId> => IdList,
    Bytes => Bytes,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

/// A change to a synced field, delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Wire name of the field.
    pub name: String,
    /// Value before the change.
    pub old: FieldValue,
    /// Value after the change.
    pub new: FieldValue,
}

macro_rules! widget_config {
    ($($(#[$meta:meta])* $name:ident: $ty:ty,)*) => {
        /// Renderer configuration.
        ///
        /// Field names are the renderer's wire names. Every field is optional;
        /// `None` leaves the renderer default in place and is not sent.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct WidgetConfig {
            $(
                $(#[$meta])*
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $name: Option<$ty>,
            )*
        }

        impl WidgetConfig {
            /// Every config field with its kind, in declaration order.
            pub const FIELDS: &'static [(&'static str, FieldKind)] = &[
                $((stringify!($name), <$ty as SyncedType>::KIND),)*
            ];

            /// Current value of the field called `name`.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidConfig`] for an unknown name.
            pub fn get(&self, name: &str) -> Result<FieldValue> {
                match name {
                    $(stringify!($name) => Ok(FieldValue::from(self.$name.clone())),)*
                    _ => Err(unknown_field(name)),
                }
            }

            /// Sets the field called `name`, returning the previous value.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidConfig`] for an unknown name or a value
            /// of the wrong kind; the config is left unchanged.
            pub fn set(&mut self, name: &str, value: FieldValue) -> Result<FieldValue> {
                match name {
                    $(stringify!($name) => {
                        let value = value.coerce(name, <$ty as SyncedType>::KIND)?;
                        let old = FieldValue::from(self.$name.take());
                        self.$name = <$ty as SyncedType>::from_field(value);
                        Ok(old)
                    })*
                    _ => Err(unknown_field(name)),
                }
            }
        }
    };
}

fn unknown_field(name: &str) -> Error {
    Error::invalid_config(format!("unknown config field '{}'", name))
}

widget_config! {
    // Simulation
    /// Disables the force simulation; points stay at their given positions.
    disable_simulation: bool,
    /// Decay coefficient of the simulation.
    simulation_decay: f64,
    /// Gravity force.
    simulation_gravity: f64,
    /// Centering force.
    simulation_center: f64,
    /// Repulsion force.
    simulation_repulsion: f64,
    /// Accuracy of the repulsion approximation.
    simulation_repulsion_theta: f64,
    /// Quadtree depth used for repulsion.
    simulation_repulsion_quadtree_levels: f64,
    /// Link spring force.
    simulation_link_spring: f64,
    /// Rest length of links.
    simulation_link_distance: f64,
    /// Random variation range applied to link distance.
    simulation_link_dist_random_variation_range: Vec<f64>,
    /// Repulsion from the mouse pointer.
    simulation_repulsion_from_mouse: f64,
    /// Friction coefficient.
    simulation_friction: f64,

    // Rendering
    /// Canvas background.
    background_color: Color,
    /// Size of the simulation space.
    space_size: i64,
    /// Colour of points without a colour column.
    default_point_color: Color,
    /// Opacity of greyed-out points.
    point_greyout_opacity: f64,
    /// Size of points without a size column.
    default_point_size: f64,
    /// Multiplier applied to point sizes.
    point_size_scale: f64,
    /// CSS cursor over a hovered point.
    hovered_point_cursor: String,
    /// Draws a ring around the hovered point.
    render_hovered_point_ring: bool,
    /// Colour of the hovered point ring.
    hovered_point_ring_color: Color,
    /// Colour of the focused point ring.
    focused_point_ring_color: Color,
    /// Index of the focused point.
    focused_point_index: i64,
    /// Draws links.
    render_links: bool,
    /// Colour of links without a colour column.
    default_link_color: Color,
    /// Opacity of greyed-out links.
    link_greyout_opacity: f64,
    /// Width of links without a width column.
    default_link_width: f64,
    /// Multiplier applied to link widths.
    link_width_scale: f64,
    /// Draws links as curves.
    curved_links: bool,
    /// Segments per curved link.
    curved_link_segments: i64,
    /// Curvature weight.
    curved_link_weight: f64,
    /// Distance of the curve control point.
    curved_link_control_point_distance: f64,
    /// Draws arrows on links.
    default_link_arrows: bool,
    /// Multiplier applied to arrow sizes.
    link_arrows_size_scale: f64,
    /// Pixel distance range over which links fade.
    link_visibility_distance_range: Vec<f64>,
    /// Minimum transparency of faded links.
    link_visibility_min_transparency: f64,
    /// Uses the quadtree repulsion approximation.
    use_quadtree: bool,
    /// Shows the FPS monitor.
    #[allow(non_snake_case)]
    show_FPS_monitor: bool,
    /// Canvas pixel ratio.
    pixel_ratio: f64,
    /// Scales points with zoom.
    scale_points_on_zoom: bool,
    /// Initial zoom level.
    initial_zoom_level: f64,
    /// Disables zooming.
    disable_zoom: bool,
    /// Allows dragging points.
    enable_drag: bool,
    /// Fits the view to the data on start.
    fit_view_on_init: bool,
    /// Delay before the initial fit, in milliseconds.
    fit_view_delay: f64,
    /// Padding of fit-view operations.
    fit_view_padding: f64,
    /// Duration of fit-view animations, in milliseconds.
    fit_view_duration: f64,
    /// Rectangle to fit on start, as two corner points.
    fit_view_by_points_in_rect: Vec<Vec<f64>>,
    /// Seed of the simulation's random layout.
    random_seed: Seed,
    /// Sampling distance for visible-point queries.
    point_sampling_distance: i64,

    // Point columns
    /// Column holding point ids.
    point_id: String,
    /// Column holding point indices.
    point_index: String,
    /// Column holding point colours.
    point_color: String,
    /// Column holding point sizes.
    point_size: String,
    /// Column holding point labels.
    point_label: String,
    /// Column holding label weights.
    point_label_weight: String,
    /// Column holding x coordinates.
    point_x: String,
    /// Column holding y coordinates.
    point_y: String,
    /// Extra point columns passed to the renderer.
    point_include_columns: Vec<String>,

    // Link columns
    /// Column holding link source ids.
    link_source: String,
    /// Column holding link source indices.
    link_source_index: String,
    /// Column holding link target ids.
    link_target: String,
    /// Column holding link target indices.
    link_target_index: String,
    /// Column holding link colours.
    link_color: String,
    /// Column holding link widths.
    link_width: String,
    /// Column toggling link arrows.
    link_arrow: String,
    /// Column holding link strengths.
    link_strength: String,
    /// Extra link columns passed to the renderer.
    link_include_columns: Vec<String>,

    // Labels
    /// Shows labels that follow the view.
    show_dynamic_labels: bool,
    /// Ids of points whose labels are always shown.
    show_labels_for: Vec<String>,
    /// Shows labels of the top points.
    show_top_labels: bool,
    /// How many top labels to show.
    show_top_labels_limit: i64,
    /// Column ranking points for top labels.
    show_top_labels_by: String,
    /// Weight of static labels.
    static_label_weight: f64,
    /// Weight of dynamic labels.
    dynamic_label_weight: f64,
    /// Padding around labels.
    label_padding: f64,
    /// Shows the hovered point's label.
    show_hovered_point_label: bool,

    // Legends
    /// Hides the point size legend.
    disable_point_size_legend: bool,
}

impl WidgetConfig {
    /// Kind of the field called `name`, if it exists.
    pub fn kind_of(name: &str) -> Option<FieldKind> {
        Self::FIELDS
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, kind)| *kind)
    }

    /// Set fields with their values, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, FieldValue)> {
        Self::FIELDS
            .iter()
            .filter_map(|(name, _)| {
                self.get(name)
                    .ok()
                    .filter(|v| !v.is_null())
                    .map(|v| (*name, v))
            })
            .collect()
    }

    /// Parses a config from JSON. Unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the JSON is malformed or does not match
    /// the catalogue.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
        Self::from_json_str(&json)
    }

    /// Serializes the set fields as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_names_are_unique() {
        let mut names: Vec<&str> = WidgetConfig::FIELDS.iter().map(|(n, _)| *n).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(WidgetConfig::kind_of("render_links"), Some(FieldKind::Bool));
        assert_eq!(WidgetConfig::kind_of("background_color"), Some(FieldKind::Color));
        assert_eq!(WidgetConfig::kind_of("random_seed"), Some(FieldKind::Seed));
        assert_eq!(
            WidgetConfig::kind_of("fit_view_by_points_in_rect"),
            Some(FieldKind::FloatMatrix)
        );
        assert_eq!(WidgetConfig::kind_of("show_FPS_monitor"), Some(FieldKind::Bool));
        assert_eq!(WidgetConfig::kind_of("nope"), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = WidgetConfig::default();
        let old = config.set("simulation_gravity", FieldValue::Float(0.25)).unwrap();
        assert!(old.is_null());
        assert_eq!(config.simulation_gravity, Some(0.25));
        assert_eq!(
            config.get("simulation_gravity").unwrap(),
            FieldValue::Float(0.25)
        );

        let old = config.set("simulation_gravity", FieldValue::Null).unwrap();
        assert_eq!(old, FieldValue::Float(0.25));
        assert_eq!(config.simulation_gravity, None);
    }

    #[test]
    fn test_set_coerces_compatible_values() {
        let mut config = WidgetConfig::default();
        config.set("point_size_scale", 2.into()).unwrap();
        assert_eq!(config.point_size_scale, Some(2.0));

        config.set("background_color", "#222".into()).unwrap();
        assert_eq!(config.background_color, Some(Color::Named("#222".into())));

        config
            .set("default_point_color", FieldValue::FloatList(vec![1.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(
            config.default_point_color,
            Some(Color::Rgba(1.0, 0.0, 0.0, 1.0))
        );

        config.set("random_seed", "abc".into()).unwrap();
        assert_eq!(config.random_seed, Some(Seed::Name("abc".into())));
    }

    #[test]
    fn test_set_rejects_wrong_kind_and_unknown_field() {
        let mut config = WidgetConfig::default();
        config.set("render_links", true.into()).unwrap();

        let err = config.set("render_links", "yes".into()).unwrap_err();
        assert!(err.to_string().contains("field 'render_links' expects boolean"));
        assert_eq!(config.render_links, Some(true));

        assert!(matches!(
            config.set("not_a_field", true.into()),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(config.get("not_a_field").is_err());
    }

    #[test]
    fn test_color_component_count() {
        assert!(Color::from_components(&[0.5, 0.5]).is_err());
        assert_eq!(
            Color::from_components(&[0.0, 0.5, 1.0, 0.25]).unwrap(),
            Color::Rgba(0.0, 0.5, 1.0, 0.25)
        );
    }

    #[test]
    fn test_rgba_components_keep_full_precision() {
        let color = FieldValue::Color(Color::Rgba(0.1, 0.2, 0.3, 1.0));
        assert_eq!(color.to_json(), json!([0.1, 0.2, 0.3, 1.0]));

        let mut config = WidgetConfig::default();
        config
            .set("background_color", FieldValue::FloatList(vec![0.1, 0.2, 0.3, 1.0]))
            .unwrap();
        let again = WidgetConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(again.background_color, Some(Color::Rgba(0.1, 0.2, 0.3, 1.0)));
        assert_eq!(
            again.get("background_color").unwrap().to_json(),
            json!([0.1, 0.2, 0.3, 1.0])
        );
    }

    #[test]
    fn test_entries_in_declaration_order() {
        let mut config = WidgetConfig::default();
        config.render_links = Some(false);
        config.disable_simulation = Some(true);
        config.point_x = Some("x".into());

        let names: Vec<&str> = config.entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["disable_simulation", "render_links", "point_x"]);
    }

    #[test]
    fn test_json_roundtrip() {
        let json = r##"{
            "render_links": false,
            "background_color": [0.0, 0.0, 0.0, 1.0],
            "default_point_color": "#ff0000",
            "random_seed": 42,
            "fit_view_by_points_in_rect": [[0.0, 0.0], [10.0, 10.0]],
            "point_include_columns": ["kind"]
        }"##;
        let config = WidgetConfig::from_json_str(json).unwrap();
        assert_eq!(config.render_links, Some(false));
        assert_eq!(config.background_color, Some(Color::Rgba(0.0, 0.0, 0.0, 1.0)));
        assert_eq!(config.random_seed, Some(Seed::Int(42)));

        let again = WidgetConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_json_rejects_unknown_keys() {
        assert!(WidgetConfig::from_json_str(r#"{"render_lnks": true}"#).is_err());
    }

    #[test]
    fn test_from_json_typed() {
        let v = FieldValue::from_json("selected_point_indices", FieldKind::IntList, &json!([1, 2]))
            .unwrap();
        assert_eq!(v, FieldValue::IntList(vec![1, 2]));

        let null =
            FieldValue::from_json("clicked_point_index", FieldKind::Int, &Value::Null).unwrap();
        assert!(null.is_null());

        assert!(FieldValue::from_json("clicked_point_index", FieldKind::Int, &json!("3")).is_err());
        assert!(FieldValue::from_json("_ipc_points", FieldKind::Bytes, &json!([1])).is_err());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(FieldValue::Null.to_json(), Value::Null);
        assert_eq!(FieldValue::Bytes(Bytes::from_static(b"abc")).to_json(), Value::Null);
        assert_eq!(
            FieldValue::Color(Color::Rgba(1.0, 0.5, 0.0, 1.0)).to_json(),
            json!([1.0, 0.5, 0.0, 1.0])
        );
        assert_eq!(FieldValue::Seed(Seed::Name("s".into())).to_json(), json!("s"));
        assert_eq!(FieldValue::IntList(vec![3, 4]).to_json(), json!([3, 4]));
        assert_eq!(
            FieldValue::IdList(vec![NodeId::Index(1), NodeId::Name("b".into())]).to_json(),
            json!([1, "b"])
        );
    }
}
