use tracing::debug;

use super::*;

/// One of the two atmospheres, with its domain and trace settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Simulation {
    Desert(DesertMirage),
    Ocean(OceanMirage),
}

impl Simulation {
    /// The value of the "model" field.
    pub fn model(&self) -> String {
        match self {
            Self::Desert(_) => DesertMirage::json_type(),
            Self::Ocean(_) => OceanMirage::json_type(),
        }
    }

    /// The scene used when a file doesn't specify one.
    pub fn default_scene(&self) -> Scene {
        match self {
            Self::Desert(_) => DesertMirage::SCENE,
            Self::Ocean(_) => OceanMirage::SCENE,
        }
    }

    /// Settings for single rays and for the display fan, in that order.
    pub fn params_mut(&mut self) -> [&mut TraceParams; 2] {
        match self {
            Self::Desert(m) => [&mut m.trace, &mut m.display],
            Self::Ocean(m) => [&mut m.trace, &mut m.display],
        }
    }

    /// Trace the display fan of `scene`, then every ray in `rays`.
    pub fn trace(&self, scene: &Scene, rays: &[Ray]) -> SceneResults {
        match self {
            Self::Desert(m) => SceneResults::Desert(Traced {
                display: m.trace_display_rays(scene),
                rays: rays.iter().map(|ray| m.trace_ray(ray)).collect(),
            }),
            Self::Ocean(m) => SceneResults::Ocean {
                duct_height: m.atmosphere.duct_height(),
                traced: Traced {
                    display: m.trace_display_rays(scene),
                    rays: rays.iter().map(|ray| m.trace_ray(ray)).collect(),
                },
            },
        }
    }
}

impl Validate for Simulation {
    fn validate(&self) -> Result<(), ParameterError> {
        match self {
            Self::Desert(m) => m.validate(),
            Self::Ocean(m) => m.validate(),
        }
    }
}

impl JsonSer for Simulation {
    fn to_json(&self) -> Value {
        let (atmosphere, domain, trace, display) = match self {
            Self::Desert(m) => (m.atmosphere.to_json(), m.domain, m.trace, m.display),
            Self::Ocean(m) => (m.atmosphere.to_json(), m.domain, m.trace, m.display),
        };

        json!({
            "model": self.model(),
            "atmosphere": atmosphere,
            "domain": domain.to_json(),
            "trace": trace.to_json(),
            "display": display.to_json(),
        })
    }
}

impl JsonDes for Simulation {
    /// Deserialize a simulation from a JSON object.
    ///
    /// Only "model" is required, everything else defaults to the model's values:
    ///
    /// ```json
    /// {
    ///     "model": "desert", // or "ocean"
    ///     "atmosphere": { ... },
    ///     "domain": { "x_min": 0.0, "x_max": 3000.0, "y_min": 0.0, "y_max": 200.0 },
    ///     "trace": { "step_size": 1.0, "max_steps": 12000, "sample_every": 8 },
    ///     "display": { "step_size": 1.0, "max_steps": 12000, "sample_every": 8 }
    /// }
    /// ```
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        let model = json
            .get("model")
            .ok_or(JsonError::Missing("model"))?
            .as_str()
            .ok_or(JsonError::WrongType {
                field: "model",
                expected: "a string",
            })?;

        let atmosphere = json.get("atmosphere");
        let domain = json.get("domain");
        let trace = json.get("trace");
        let display = json.get("display");

        if model == DesertMirage::json_type() {
            Ok(Self::Desert(DesertMirage {
                atmosphere: DesertAtmosphere::default().patched(atmosphere)?,
                domain: DesertMirage::DOMAIN.patched(domain)?,
                trace: DesertMirage::TRACE.patched(trace)?,
                display: DesertMirage::TRACE.patched(display)?,
            }))
        } else if model == OceanMirage::json_type() {
            Ok(Self::Ocean(OceanMirage {
                atmosphere: OceanAtmosphere::default().patched(atmosphere)?,
                domain: OceanMirage::DOMAIN.patched(domain)?,
                trace: OceanMirage::TRACE.patched(trace)?,
                display: OceanMirage::DISPLAY.patched(display)?,
            }))
        } else {
            Err(JsonError::UnknownModel(model.into()))
        }
    }
}

/// A simulation, the scene to display, and extra rays to trace.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneFile {
    pub simulation: Simulation,
    pub scene: Scene,
    pub rays: Vec<Ray>,
}

impl SceneFile {
    #[inline]
    pub fn trace(&self) -> SceneResults {
        self.simulation.trace(&self.scene, &self.rays)
    }
}

impl Validate for SceneFile {
    fn validate(&self) -> Result<(), ParameterError> {
        self.simulation.validate()?;
        self.scene.validate()
    }
}

impl JsonDes for SceneFile {
    /// A [`Simulation`] object, with two more optional fields:
    ///
    /// ```json
    /// {
    ///     "model": "ocean",
    ///     "scene": { "object_x": 15000.0, "object_height": 25.0, "observer_x": 0.0,
    ///                "observer_height": 15.0, "ray_count": 10 },
    ///     "rays": [ { "origin": [0.0, 15.0], "angle": 0.0 } ]
    /// }
    /// ```
    ///
    /// The result is validated.
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        let simulation = Simulation::from_json(json)?;
        let scene = simulation.default_scene().patched(json.get("scene"))?;
        let rays: Vec<Ray> = json.get("rays").map_or(Ok(Vec::new()), Vec::from_json)?;

        let file = Self {
            simulation,
            scene,
            rays,
        };
        file.validate()?;

        Ok(file)
    }
}

impl JsonSer for SceneFile {
    fn to_json(&self) -> Value {
        serialize_scene(&self.simulation, &self.scene, &self.rays)
    }
}

/// The rays traced for a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Traced<C> {
    /// The display fan, in launch order.
    pub display: Vec<RayResult<C>>,
    /// The extra rays, in file order.
    pub rays: Vec<RayResult<C>>,
}

impl<C> Traced<C> {
    pub fn iter(&self) -> impl Iterator<Item = &RayResult<C>> {
        self.display.iter().chain(&self.rays)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneResults {
    Desert(Traced<TurningPoint>),
    Ocean {
        /// See [`OceanAtmosphere::duct_height`].
        duct_height: Float,
        traced: Traced<DuctTrap>,
    },
}

impl SceneResults {
    /// How every traced ray ended, display rays first.
    pub fn terminations(&self) -> Vec<Termination> {
        match self {
            Self::Desert(traced) => traced.iter().map(|r| r.termination).collect(),
            Self::Ocean { traced, .. } => traced.iter().map(|r| r.termination).collect(),
        }
    }

    /// Number of rays of each kind of [`Termination`], in the order of [`Termination::ALL`].
    pub fn termination_counts(&self) -> [(Termination, usize); 4] {
        let terminations = self.terminations();
        Termination::ALL.map(|t| (t, terminations.iter().filter(|&&u| u == t).count()))
    }
}

impl JsonSer for SceneResults {
    fn to_json(&self) -> Value {
        match self {
            Self::Desert(traced) => json!({
                "model": DesertMirage::json_type(),
                "display": traced.display.to_json(),
                "rays": traced.rays.to_json(),
            }),
            Self::Ocean {
                duct_height,
                traced,
            } => json!({
                "model": OceanMirage::json_type(),
                "duct_height": duct_height,
                "display": traced.display.to_json(),
                "rays": traced.rays.to_json(),
            }),
        }
    }
}

pub fn serialize_scene(simulation: &Simulation, scene: &Scene, rays: &[Ray]) -> Value {
    let mut json = simulation.to_json();

    if let Value::Object(fields) = &mut json {
        fields.insert("scene".into(), scene.to_json());
        fields.insert("rays".into(), rays.to_json());
    }

    json
}

pub fn deserialize_scene(json: &Value) -> Result<SceneFile, JsonError> {
    let file = SceneFile::from_json(json)?;

    debug!(
        model = %file.simulation.model(),
        rays = file.rays.len(),
        display_rays = file.scene.ray_count,
        "scene loaded"
    );

    Ok(file)
}
