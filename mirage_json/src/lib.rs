use mirage::{nalgebra::Vector2, *};
use mirage_atmospheres::*;

use serde_json::{json, Value};

mod scene;

pub use scene::*;
pub use serde_json;

/// Everything that can go wrong reading a scene file.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("`{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown model `{0}`, expected `desert` or `ocean`")]
    UnknownModel(String),

    #[error("invalid ray: {0}")]
    InvalidRay(&'static str),

    #[error(transparent)]
    Invalid(#[from] ParameterError),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub trait JsonType {
    /// Returns a string, unique to the type, found in the "model" field of
    /// the json representation of a scene using it
    fn json_type() -> String;
}

impl JsonType for DesertMirage {
    fn json_type() -> String {
        "desert".into()
    }
}

impl JsonType for OceanMirage {
    fn json_type() -> String {
        "ocean".into()
    }
}

pub trait JsonSer {
    /// Serialize `self` into a JSON object.
    fn to_json(&self) -> Value;
}

impl<T: JsonSer> JsonSer for [T] {
    fn to_json(&self) -> Value {
        Value::Array(Vec::from_iter(self.iter().map(T::to_json)))
    }
}

impl<T: JsonSer> JsonSer for Vec<T> {
    fn to_json(&self) -> Value {
        self.as_slice().to_json()
    }
}

impl<T: JsonSer + ?Sized> JsonSer for &T {
    fn to_json(&self) -> Value {
        (*self).to_json()
    }
}

pub trait JsonDes {
    /// Deserialize from a JSON object.
    ///
    /// Returns an error if `json`'s format or values are invalid.
    fn from_json(json: &Value) -> Result<Self, JsonError>
    where
        Self: Sized;
}

impl<T: JsonDes> JsonDes for Vec<T> {
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        map_json_array(json, "rays", T::from_json)
    }
}

/// Overwrite the fields present in a JSON object, leaving the others as they are.
pub trait JsonPatch {
    fn patch_json(&mut self, json: &Value) -> Result<(), JsonError>;

    /// `self`, patched with `json` if it is `Some`.
    fn patched(mut self, json: Option<&Value>) -> Result<Self, JsonError>
    where
        Self: Sized,
    {
        if let Some(json) = json {
            self.patch_json(json)?;
        }
        Ok(self)
    }
}

pub fn json_array_to_vector(json_array: &[Value]) -> Option<Vector2<Float>> {
    let [x, y]: &[Value; 2] = json_array.try_into().ok()?;
    Some(Vector2::new(x.as_f64()?, y.as_f64()?))
}

pub fn map_json_array<C: FromIterator<T>, T>(
    json: &Value,
    field: &'static str,
    map: impl FnMut(&Value) -> Result<T, JsonError>,
) -> Result<C, JsonError> {
    json.as_array()
        .ok_or(JsonError::WrongType {
            field,
            expected: "an array",
        })?
        .iter()
        .map(map)
        .collect()
}

fn expect_object(json: &Value, field: &'static str) -> Result<(), JsonError> {
    if json.is_object() {
        Ok(())
    } else {
        Err(JsonError::WrongType {
            field,
            expected: "an object",
        })
    }
}

fn patch_float(json: &Value, field: &'static str, value: &mut Float) -> Result<(), JsonError> {
    if let Some(v) = json.get(field) {
        *value = v.as_f64().ok_or(JsonError::WrongType {
            field,
            expected: "a number",
        })?;
    }
    Ok(())
}

fn patch_usize(json: &Value, field: &'static str, value: &mut usize) -> Result<(), JsonError> {
    if let Some(v) = json.get(field) {
        *value = v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(JsonError::WrongType {
                field,
                expected: "a non-negative integer",
            })?;
    }
    Ok(())
}

fn patch_bool(json: &Value, field: &'static str, value: &mut bool) -> Result<(), JsonError> {
    if let Some(v) = json.get(field) {
        *value = v.as_bool().ok_or(JsonError::WrongType {
            field,
            expected: "a boolean",
        })?;
    }
    Ok(())
}

impl JsonSer for DesertAtmosphere {
    fn to_json(&self) -> Value {
        json!({
            "n_base": self.n_base,
            "delta_n": self.delta_n,
            "scale_height": self.scale_height,
            "ground_temp": self.ground_temp,
            "air_temp": self.air_temp,
        })
    }
}

impl JsonPatch for DesertAtmosphere {
    fn patch_json(&mut self, json: &Value) -> Result<(), JsonError> {
        expect_object(json, "atmosphere")?;
        patch_float(json, "n_base", &mut self.n_base)?;
        patch_float(json, "delta_n", &mut self.delta_n)?;
        patch_float(json, "scale_height", &mut self.scale_height)?;
        patch_float(json, "ground_temp", &mut self.ground_temp)?;
        patch_float(json, "air_temp", &mut self.air_temp)
    }
}

impl JsonDes for DesertAtmosphere {
    /// Deserialize a desert atmosphere from a JSON object.
    ///
    /// Every field is optional, missing ones take their default value:
    ///
    /// ```json
    /// {
    ///     "n_base": 1.000293,
    ///     "delta_n": 2.4e-4,
    ///     "scale_height": 3.0,
    ///     "ground_temp": 65.0,
    ///     "air_temp": 28.0
    /// }
    /// ```
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        Self::default().patched(Some(json))
    }
}

impl JsonSer for OceanAtmosphere {
    fn to_json(&self) -> Value {
        json!({
            "n_base": self.n_base,
            "a": self.a,
            "b": self.b,
            "h1": self.h1,
            "h2": self.h2,
            "sea_temp": self.sea_temp,
            "air_temp": self.air_temp,
            "ducting_enabled": self.ducting_enabled,
        })
    }
}

impl JsonPatch for OceanAtmosphere {
    fn patch_json(&mut self, json: &Value) -> Result<(), JsonError> {
        expect_object(json, "atmosphere")?;
        patch_float(json, "n_base", &mut self.n_base)?;
        patch_float(json, "a", &mut self.a)?;
        patch_float(json, "b", &mut self.b)?;
        patch_float(json, "h1", &mut self.h1)?;
        patch_float(json, "h2", &mut self.h2)?;
        patch_float(json, "sea_temp", &mut self.sea_temp)?;
        patch_float(json, "air_temp", &mut self.air_temp)?;
        patch_bool(json, "ducting_enabled", &mut self.ducting_enabled)
    }
}

impl JsonDes for OceanAtmosphere {
    /// Deserialize an ocean atmosphere from a JSON object.
    ///
    /// Every field is optional, missing ones take their default value:
    ///
    /// ```json
    /// {
    ///     "n_base": 1.000293,
    ///     "a": 1.2e-4,
    ///     "b": 4.0e-5,
    ///     "h1": 12.0,
    ///     "h2": 40.0,
    ///     "sea_temp": 10.0,
    ///     "air_temp": 25.0,
    ///     "ducting_enabled": true
    /// }
    /// ```
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        Self::default().patched(Some(json))
    }
}

impl JsonSer for DomainBounds {
    fn to_json(&self) -> Value {
        json!({
            "x_min": self.x_min,
            "x_max": self.x_max,
            "y_min": self.y_min,
            "y_max": self.y_max,
        })
    }
}

impl JsonPatch for DomainBounds {
    fn patch_json(&mut self, json: &Value) -> Result<(), JsonError> {
        expect_object(json, "domain")?;
        patch_float(json, "x_min", &mut self.x_min)?;
        patch_float(json, "x_max", &mut self.x_max)?;
        patch_float(json, "y_min", &mut self.y_min)?;
        patch_float(json, "y_max", &mut self.y_max)
    }
}

impl JsonSer for TraceParams {
    fn to_json(&self) -> Value {
        json!({
            "step_size": self.step_size,
            "max_steps": self.max_steps,
            "sample_every": self.sample_every,
        })
    }
}

impl JsonPatch for TraceParams {
    fn patch_json(&mut self, json: &Value) -> Result<(), JsonError> {
        expect_object(json, "trace")?;
        patch_float(json, "step_size", &mut self.step_size)?;
        patch_usize(json, "max_steps", &mut self.max_steps)?;
        patch_usize(json, "sample_every", &mut self.sample_every)
    }
}

impl JsonSer for Scene {
    fn to_json(&self) -> Value {
        json!({
            "object_x": self.object_x,
            "object_height": self.object_height,
            "observer_x": self.observer_x,
            "observer_height": self.observer_height,
            "ray_count": self.ray_count,
        })
    }
}

impl JsonPatch for Scene {
    fn patch_json(&mut self, json: &Value) -> Result<(), JsonError> {
        expect_object(json, "scene")?;
        patch_float(json, "object_x", &mut self.object_x)?;
        patch_float(json, "object_height", &mut self.object_height)?;
        patch_float(json, "observer_x", &mut self.observer_x)?;
        patch_float(json, "observer_height", &mut self.observer_height)?;
        patch_usize(json, "ray_count", &mut self.ray_count)
    }
}

impl JsonSer for Ray {
    /// Serialize a ray into a JSON object.
    ///
    /// The format of the returned object is explained in [`Self::from_json`]
    fn to_json(&self) -> Value {
        json!({
            "origin": self.origin.as_slice(),
            "direction": self.direction.as_ref().as_slice(),
        })
    }
}

impl JsonDes for Ray {
    /// Deserialize a new ray from a JSON object.
    ///
    /// The JSON object must follow one of the following formats:
    ///
    /// ```json
    /// {
    ///     "origin": [0.0, 1.0],
    ///     "angle": 0.01 // heading, in radians, counter-clockwise from +x
    /// }
    /// ```
    ///
    /// ```json
    /// {
    ///     "origin": [0.0, 1.0],
    ///     "direction": [1.0, 0.01] // must not be zero
    /// }
    /// ```
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        let origin = json
            .get("origin")
            .and_then(Value::as_array)
            .ok_or(JsonError::InvalidRay("missing origin"))?;

        let origin =
            json_array_to_vector(origin).ok_or(JsonError::InvalidRay("origin must be [x, y]"))?;

        if let Some(angle) = json.get("angle") {
            let angle = angle
                .as_f64()
                .ok_or(JsonError::InvalidRay("angle must be a number"))?;
            return Ok(Self::from_angle(origin, angle));
        }

        let direction = json
            .get("direction")
            .and_then(Value::as_array)
            .ok_or(JsonError::InvalidRay("missing angle or direction"))?;

        let direction = json_array_to_vector(direction)
            .ok_or(JsonError::InvalidRay("direction must be [dx, dy]"))?;

        Self::try_new(origin, direction).ok_or(JsonError::InvalidRay("unable to normalize direction"))
    }
}

impl JsonSer for TurningPoint {
    fn to_json(&self) -> Value {
        json!({
            "has_turning_point": self.has_turning_point,
            "turning_y": self.turning_y,
            "ground_contacts": self.ground_contacts,
        })
    }
}

impl JsonSer for DuctTrap {
    fn to_json(&self) -> Value {
        json!({
            "is_trapped": self.is_trapped,
            "oscillation_count": self.oscillation_count,
            "min_y": self.min_y,
            "max_y": self.max_y,
        })
    }
}

impl<C: JsonSer> JsonSer for RayResult<C> {
    /// The classification's fields are flattened into the result's object.
    fn to_json(&self) -> Value {
        let mut json = json!({
            "points": Vec::from_iter(self.points.iter().map(|p| [p.x, p.y])),
            "termination": self.termination.as_str(),
            "final_y": self.final_y,
            "arc_length": self.arc_length,
            "steps": self.steps,
        });

        if let (Value::Object(fields), Value::Object(class)) =
            (&mut json, self.classification.to_json())
        {
            fields.extend(class);
        }

        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_atmosphere_keeps_defaults() {
        let atm = DesertAtmosphere::from_json(&json!({ "scale_height": 5.0 })).unwrap();
        assert_eq!(
            atm,
            DesertAtmosphere {
                scale_height: 5.0,
                ..Default::default()
            }
        );

        let atm = OceanAtmosphere::from_json(&json!({ "ducting_enabled": false })).unwrap();
        assert!(!atm.ducting_enabled);
        assert_eq!(atm.h2, 40.0);
    }

    #[test]
    fn test_wrong_field_type() {
        let err = OceanAtmosphere::from_json(&json!({ "h1": "twelve" })).unwrap_err();
        assert!(matches!(
            err,
            JsonError::WrongType {
                field: "h1",
                expected: "a number"
            }
        ));

        let err = TraceParams::new(1.0, 10, 1)
            .patched(Some(&json!({ "max_steps": -3 })))
            .unwrap_err();
        assert!(matches!(err, JsonError::WrongType { field: "max_steps", .. }));

        assert!(DesertAtmosphere::from_json(&json!([1.0])).is_err());
    }

    #[test]
    fn test_patch_scene() {
        let scene = DesertMirage::SCENE
            .patched(Some(&json!({ "ray_count": 3, "observer_height": 1.5 })))
            .unwrap();
        assert_eq!(scene.ray_count, 3);
        assert_eq!(scene.observer_height, 1.5);
        assert_eq!(scene.object_x, 1800.0);

        assert_eq!(DesertMirage::SCENE.patched(None).unwrap(), DesertMirage::SCENE);
    }

    #[test]
    fn test_ray_from_angle_or_direction() {
        let ray = Ray::from_json(&json!({ "origin": [0.0, 1.0], "angle": 0.0 })).unwrap();
        assert_eq!(ray, Ray::from_angle([0.0, 1.0], 0.0));

        let ray = Ray::from_json(&json!({ "origin": [2.0, 3.0], "direction": [0.0, -2.0] })).unwrap();
        assert_eq!(ray.origin, Vector2::new(2.0, 3.0));
        assert_eq!(ray.direction.into_inner(), Vector2::new(0.0, -1.0));
    }

    #[test]
    fn test_invalid_rays() {
        for json in [
            json!({ "angle": 0.0 }),
            json!({ "origin": [0.0], "angle": 0.0 }),
            json!({ "origin": [0.0, 1.0] }),
            json!({ "origin": [0.0, 1.0], "direction": [0.0, 0.0] }),
            json!({ "origin": [0.0, 1.0], "angle": "up" }),
        ] {
            assert!(
                matches!(Ray::from_json(&json), Err(JsonError::InvalidRay(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn test_ray_result_flattens_classification() {
        let result = RayResult {
            points: vec![Vector2::new(0.0, 1.0), Vector2::new(3.0, 0.0)],
            termination: Termination::Surface,
            final_y: -0.2,
            arc_length: 3.2,
            steps: 4,
            classification: DuctTrap {
                is_trapped: false,
                oscillation_count: 1,
                min_y: -0.2,
                max_y: 1.0,
            },
        };

        assert_eq!(
            result.to_json(),
            json!({
                "points": [[0.0, 1.0], [3.0, 0.0]],
                "termination": "surface",
                "final_y": -0.2,
                "arc_length": 3.2,
                "steps": 4,
                "is_trapped": false,
                "oscillation_count": 1,
                "min_y": -0.2,
                "max_y": 1.0,
            })
        );
    }
}
