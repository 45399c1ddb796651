//! Emitter definitions (parsed from the JSON particle data file)

use crate::flags::ParticleFlags;
use ember_core::{EmberError, ResourceId, ResourceLoader, Result};
use glam::Vec3;
use serde_json::{json, Map, Value};

/// Shader used when a definition does not name one
pub const DEFAULT_PARTICLE_SHADER: &str = "generic_particle.wgsl";

/// A closed `[min, max]` interval that particle attributes are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in the range (either bound order is accepted)
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min.min(self.max) && value <= self.max.max(self.min)
    }
}

/// Axis that rotated particles spin around
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

impl RotationAxis {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            other => Err(EmberError::InvalidEnumValue {
                value: other.to_string(),
                allowed: vec!["x".into(), "y".into(), "z".into()],
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }

    pub fn to_vec3(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }
}

/// Where texture and shader paths are resolved from while loading
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSettings {
    pub textures_root: String,
    pub shaders_root: String,
    pub default_shader: String,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            textures_root: "textures/".to_string(),
            shaders_root: "shaders/".to_string(),
            default_shader: DEFAULT_PARTICLE_SHADER.to_string(),
        }
    }
}

/// Immutable emitter template, looked up by name when emitters are created
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterDefinition {
    pub name: String,
    /// Texture path as written in the data file (relative to the textures root)
    pub texture_path: String,
    pub texture: ResourceId,
    /// Shader path as written in the data file, `None` for the default shader
    pub shader_path: Option<String>,
    pub shader: ResourceId,
    pub particle_count: usize,
    pub flags: ParticleFlags,
    pub lifetime_range: FloatRange,
    pub position_x_range: FloatRange,
    pub position_y_range: FloatRange,
    pub velocity_x_range: FloatRange,
    pub velocity_y_range: FloatRange,
    pub size_range: FloatRange,
    pub initial_angle_range: FloatRange,
    /// Added to every particle's velocity each millisecond (z is always 0)
    pub gravity_velocity: Vec3,
    pub enlargement_speed: f32,
    pub rotation_speed: f32,
    pub generation_delay_secs: f32,
    pub rotation_axis: Option<RotationAxis>,
}

impl EmitterDefinition {
    /// A definition with the given name, capacity and flags and every range zeroed
    pub fn new(name: impl Into<String>, particle_count: usize, flags: ParticleFlags) -> Self {
        Self {
            name: name.into(),
            texture_path: String::new(),
            texture: ResourceId::NONE,
            shader_path: None,
            shader: ResourceId::NONE,
            particle_count,
            flags,
            lifetime_range: FloatRange::ZERO,
            position_x_range: FloatRange::ZERO,
            position_y_range: FloatRange::ZERO,
            velocity_x_range: FloatRange::ZERO,
            velocity_y_range: FloatRange::ZERO,
            size_range: FloatRange::ZERO,
            initial_angle_range: FloatRange::ZERO,
            gravity_velocity: Vec3::ZERO,
            enlargement_speed: 0.0,
            rotation_speed: 0.0,
            generation_delay_secs: 0.0,
            rotation_axis: None,
        }
    }

    /// Parse one record of the `particle_data` array.
    ///
    /// Missing required fields fail the record; malformed optional fields are
    /// logged and left at zero.
    pub fn from_json(
        record: &Value,
        settings: &LoadSettings,
        loader: &mut dyn ResourceLoader,
    ) -> Result<Self> {
        let table = record.as_object().ok_or_else(|| EmberError::DefinitionParse {
            definition: "<unnamed>".to_string(),
            message: "particle definition must be an object".to_string(),
        })?;

        let name = required(table, "<unnamed>", "name")?
            .as_str()
            .ok_or_else(|| invalid_type("name", "string"))?
            .to_string();
        let def_name = name.as_str();

        let texture_path = required(table, def_name, "texture")?
            .as_str()
            .ok_or_else(|| invalid_type("texture", "string"))?
            .to_string();
        let shader_path = match table.get("shader") {
            Some(v) => match v.as_str() {
                Some(s) => Some(s.to_string()),
                None => {
                    tracing::warn!(definition = def_name, "ignoring non-string 'shader' field");
                    None
                }
            },
            None => None,
        };

        let particle_count = required(table, def_name, "particle_count")?
            .as_u64()
            .ok_or_else(|| invalid_type("particle_count", "non-negative integer"))?
            as usize;

        let mut flags = ParticleFlags::empty();
        for (field, flag) in [
            ("prefilled", ParticleFlags::PREFILLED),
            ("continuous_generation", ParticleFlags::CONTINUOUS_GENERATION),
            ("enlarge_over_time", ParticleFlags::ENLARGE_OVER_TIME),
            ("rotate_over_time", ParticleFlags::ROTATE_OVER_TIME),
            ("initially_rotated", ParticleFlags::INITIALLY_ROTATED),
            ("custom_update", ParticleFlags::CUSTOM_UPDATE),
        ] {
            if required_bool(table, def_name, field)? {
                flags |= flag;
            }
        }

        let mut definition = Self::new(name.clone(), particle_count, flags);
        definition.texture = loader.load_resource(&format!("{}{}", settings.textures_root, texture_path));
        definition.shader = loader.load_resource(&format!(
            "{}{}",
            settings.shaders_root,
            shader_path.as_deref().unwrap_or(&settings.default_shader)
        ));
        definition.texture_path = texture_path;
        definition.shader_path = shader_path;

        definition.lifetime_range = required_range(table, def_name, "lifetime_range")?;
        definition.position_x_range = required_range(table, def_name, "position_x_range")?;
        definition.position_y_range = required_range(table, def_name, "position_y_range")?;
        definition.size_range = required_range(table, def_name, "particle_size_range")?;

        definition.velocity_x_range = optional_range(table, def_name, "velocity_x_range");
        definition.velocity_y_range = optional_range(table, def_name, "velocity_y_range");
        definition.gravity_velocity = optional_gravity(table, def_name);

        if flags.contains(ParticleFlags::ENLARGE_OVER_TIME) {
            definition.enlargement_speed =
                required_f32(table, def_name, "particle_enlargement_speed")?;
        }
        if flags.contains(ParticleFlags::CONTINUOUS_GENERATION) {
            definition.generation_delay_secs =
                required_f32(table, def_name, "particle_generation_delay_secs")?;
        }
        if flags.contains(ParticleFlags::ROTATE_OVER_TIME) {
            definition.rotation_speed = required_f32(table, def_name, "particle_rotation_speed")?;
        }
        if flags.contains(ParticleFlags::INITIALLY_ROTATED) {
            definition.initial_angle_range =
                required_range(table, def_name, "particle_initial_angle_range")?;
        }
        if flags.uses_rotation() {
            let axis = required(table, def_name, "rotation_axis")?
                .as_str()
                .ok_or_else(|| invalid_type("rotation_axis", "string"))?;
            definition.rotation_axis = Some(RotationAxis::parse(axis)?);
        }

        Ok(definition)
    }

    /// Serialize back to the data file's record format.
    ///
    /// Conditional fields are only written when their flag is set, matching
    /// what `from_json` reads.
    pub fn to_json(&self) -> Value {
        let mut record = Map::new();
        record.insert("name".into(), json!(self.name));
        record.insert("texture".into(), json!(self.texture_path));
        if let Some(shader) = &self.shader_path {
            record.insert("shader".into(), json!(shader));
        }
        record.insert("particle_count".into(), json!(self.particle_count));
        record.insert("prefilled".into(), json!(self.flags.contains(ParticleFlags::PREFILLED)));
        record.insert(
            "continuous_generation".into(),
            json!(self.flags.contains(ParticleFlags::CONTINUOUS_GENERATION)),
        );
        record.insert(
            "enlarge_over_time".into(),
            json!(self.flags.contains(ParticleFlags::ENLARGE_OVER_TIME)),
        );
        record.insert(
            "rotate_over_time".into(),
            json!(self.flags.contains(ParticleFlags::ROTATE_OVER_TIME)),
        );
        record.insert(
            "initially_rotated".into(),
            json!(self.flags.contains(ParticleFlags::INITIALLY_ROTATED)),
        );
        record.insert(
            "custom_update".into(),
            json!(self.flags.contains(ParticleFlags::CUSTOM_UPDATE)),
        );
        record.insert("lifetime_range".into(), range_json(self.lifetime_range));
        record.insert("position_x_range".into(), range_json(self.position_x_range));
        record.insert("position_y_range".into(), range_json(self.position_y_range));
        record.insert("particle_size_range".into(), range_json(self.size_range));
        record.insert("velocity_x_range".into(), range_json(self.velocity_x_range));
        record.insert("velocity_y_range".into(), range_json(self.velocity_y_range));
        record.insert(
            "gravity_velocity".into(),
            json!({ "x": f32_json(self.gravity_velocity.x), "y": f32_json(self.gravity_velocity.y) }),
        );

        if self.flags.contains(ParticleFlags::ENLARGE_OVER_TIME) {
            record.insert("particle_enlargement_speed".into(), f32_json(self.enlargement_speed));
        }
        if self.flags.contains(ParticleFlags::CONTINUOUS_GENERATION) {
            record.insert(
                "particle_generation_delay_secs".into(),
                f32_json(self.generation_delay_secs),
            );
        }
        if self.flags.contains(ParticleFlags::ROTATE_OVER_TIME) {
            record.insert("particle_rotation_speed".into(), f32_json(self.rotation_speed));
        }
        if self.flags.contains(ParticleFlags::INITIALLY_ROTATED) {
            record.insert(
                "particle_initial_angle_range".into(),
                range_json(self.initial_angle_range),
            );
        }
        if let Some(axis) = self.rotation_axis {
            record.insert("rotation_axis".into(), json!(axis.as_str()));
        }

        Value::Object(record)
    }
}

// ── JSON helpers ──

fn required<'a>(table: &'a Map<String, Value>, definition: &str, field: &str) -> Result<&'a Value> {
    table.get(field).ok_or_else(|| EmberError::MissingRequiredField {
        definition: definition.to_string(),
        field: field.to_string(),
    })
}

fn invalid_type(field: &str, expected: &str) -> EmberError {
    EmberError::InvalidFieldType {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

fn json_f32(v: &Value) -> Option<f32> {
    v.as_f64().map(|f| f as f32)
}

fn required_f32(table: &Map<String, Value>, definition: &str, field: &str) -> Result<f32> {
    json_f32(required(table, definition, field)?).ok_or_else(|| invalid_type(field, "number"))
}

fn required_bool(table: &Map<String, Value>, definition: &str, field: &str) -> Result<bool> {
    required(table, definition, field)?
        .as_bool()
        .ok_or_else(|| invalid_type(field, "bool"))
}

fn parse_range(v: &Value) -> Option<FloatRange> {
    let min = json_f32(v.get("min")?)?;
    let max = json_f32(v.get("max")?)?;
    Some(FloatRange { min, max })
}

fn required_range(table: &Map<String, Value>, definition: &str, field: &str) -> Result<FloatRange> {
    parse_range(required(table, definition, field)?)
        .ok_or_else(|| invalid_type(field, "object with numeric 'min' and 'max'"))
}

fn optional_range(table: &Map<String, Value>, definition: &str, field: &str) -> FloatRange {
    match table.get(field) {
        None => FloatRange::ZERO,
        Some(v) => parse_range(v).unwrap_or_else(|| {
            tracing::warn!(definition, field, "malformed range, defaulting to zero");
            FloatRange::ZERO
        }),
    }
}

fn optional_gravity(table: &Map<String, Value>, definition: &str) -> Vec3 {
    let Some(v) = table.get("gravity_velocity") else {
        return Vec3::ZERO;
    };
    let x = v.get("x").and_then(json_f32);
    let y = v.get("y").and_then(json_f32);
    match (x, y) {
        (Some(x), Some(y)) => Vec3::new(x, y, 0.0),
        _ => {
            tracing::warn!(definition, "malformed 'gravity_velocity', defaulting to zero");
            Vec3::ZERO
        }
    }
}

fn range_json(range: FloatRange) -> Value {
    json!({ "min": f32_json(range.min), "max": f32_json(range.max) })
}

/// Numbers go out as the shortest text that reads back as the same `f32`,
/// not as the widened `f64` (`0.1`, not `0.10000000149011612`).
fn f32_json(v: f32) -> Value {
    v.to_string().parse::<f64>().map_or(Value::Null, Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::ResourceRegistry;

    fn parse(record: Value) -> Result<EmitterDefinition> {
        let mut registry = ResourceRegistry::new();
        EmitterDefinition::from_json(&record, &LoadSettings::default(), &mut registry)
    }

    fn base_record() -> Value {
        json!({
            "name": "sparks",
            "texture": "spark.png",
            "particle_count": 20,
            "prefilled": true,
            "continuous_generation": false,
            "enlarge_over_time": false,
            "rotate_over_time": false,
            "initially_rotated": false,
            "custom_update": false,
            "lifetime_range": { "min": 0.5, "max": 1.5 },
            "position_x_range": { "min": -0.1, "max": 0.1 },
            "position_y_range": { "min": -0.2, "max": 0.2 },
            "particle_size_range": { "min": 0.01, "max": 0.02 }
        })
    }

    #[test]
    fn parse_minimal_record() {
        let def = parse(base_record()).unwrap();
        assert_eq!(def.name, "sparks");
        assert_eq!(def.particle_count, 20);
        assert_eq!(def.flags, ParticleFlags::PREFILLED);
        assert_eq!(def.lifetime_range, FloatRange::new(0.5, 1.5));
        assert_eq!(def.velocity_x_range, FloatRange::ZERO);
        assert_eq!(def.gravity_velocity, Vec3::ZERO);
        assert!(def.shader_path.is_none());
        assert!(!def.shader.is_none());
        assert!(!def.texture.is_none());
    }

    #[test]
    fn default_shader_resolves_under_shaders_root() {
        let mut registry = ResourceRegistry::new();
        let def = EmitterDefinition::from_json(&base_record(), &LoadSettings::default(), &mut registry)
            .unwrap();
        assert_eq!(registry.path(def.shader), Some("shaders/generic_particle.wgsl"));
        assert_eq!(registry.path(def.texture), Some("textures/spark.png"));
    }

    #[test]
    fn missing_required_field_fails() {
        let mut record = base_record();
        record.as_object_mut().unwrap().remove("lifetime_range");
        match parse(record) {
            Err(EmberError::MissingRequiredField { definition, field }) => {
                assert_eq!(definition, "sparks");
                assert_eq!(field, "lifetime_range");
            }
            other => panic!("expected missing field error, got {other:?}"),
        }
    }

    #[test]
    fn conditionally_required_fields() {
        let mut record = base_record();
        record["continuous_generation"] = json!(true);
        record["prefilled"] = json!(false);
        assert!(matches!(
            parse(record.clone()),
            Err(EmberError::MissingRequiredField { .. })
        ));

        record["particle_generation_delay_secs"] = json!(0.25);
        let def = parse(record).unwrap();
        assert_eq!(def.generation_delay_secs, 0.25);
    }

    #[test]
    fn rotation_axis_required_and_validated() {
        let mut record = base_record();
        record["rotate_over_time"] = json!(true);
        record["particle_rotation_speed"] = json!(0.002);
        assert!(parse(record.clone()).is_err());

        record["rotation_axis"] = json!("w");
        assert!(matches!(
            parse(record.clone()),
            Err(EmberError::InvalidEnumValue { .. })
        ));

        record["rotation_axis"] = json!("z");
        let def = parse(record).unwrap();
        assert_eq!(def.rotation_axis, Some(RotationAxis::Z));
        assert_eq!(def.rotation_axis.unwrap().to_vec3(), Vec3::Z);
    }

    #[test]
    fn malformed_optional_fields_default_to_zero() {
        let mut record = base_record();
        record["velocity_x_range"] = json!({ "min": "fast" });
        record["gravity_velocity"] = json!([0, -1]);
        record["velocity_y_range"] = json!({ "min": -1, "max": 2 });
        let def = parse(record).unwrap();
        assert_eq!(def.velocity_x_range, FloatRange::ZERO);
        assert_eq!(def.gravity_velocity, Vec3::ZERO);
        assert_eq!(def.velocity_y_range, FloatRange::new(-1.0, 2.0));
    }

    #[test]
    fn wrong_type_for_required_field_fails() {
        let mut record = base_record();
        record["particle_count"] = json!(-3);
        assert!(matches!(
            parse(record),
            Err(EmberError::InvalidFieldType { .. })
        ));
    }

    #[test]
    fn export_omits_inactive_conditional_fields() {
        let def = parse(base_record()).unwrap();
        let exported = def.to_json();
        assert!(exported.get("particle_generation_delay_secs").is_none());
        assert!(exported.get("rotation_axis").is_none());
        assert!(exported.get("shader").is_none());
        assert_eq!(exported["texture"], json!("spark.png"));
    }

    #[test]
    fn export_writes_shortest_float_text() {
        let mut record = base_record();
        record["continuous_generation"] = json!(true);
        record["prefilled"] = json!(false);
        record["particle_generation_delay_secs"] = json!(0.1);
        record["velocity_y_range"] = json!({ "min": 0.0003, "max": 1.7 });
        let def = parse(record).unwrap();

        let text = serde_json::to_string(&def.to_json()).unwrap();
        assert!(text.contains("\"particle_generation_delay_secs\":0.1"));
        assert!(text.contains("0.0003"));
        assert!(!text.contains("0.10000000149011612"));
        assert!(!text.contains("1.7000000476837158"));

        let reparsed = parse(serde_json::from_str(&text).unwrap()).unwrap();
        assert_eq!(reparsed.generation_delay_secs.to_bits(), def.generation_delay_secs.to_bits());
        assert_eq!(reparsed.velocity_y_range.min.to_bits(), def.velocity_y_range.min.to_bits());
        assert_eq!(reparsed.velocity_y_range.max.to_bits(), def.velocity_y_range.max.to_bits());
    }

    #[test]
    fn range_contains_accepts_either_order() {
        let r = FloatRange::new(2.0, -2.0);
        assert!(r.contains(0.0));
        assert!(r.contains(-2.0));
        assert!(!r.contains(2.5));
    }
}
