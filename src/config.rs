use std::env;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BRUSH_DIAMETER: f32 = 40.0;
/// White at 70% opacity.
pub const DEFAULT_BRUSH_COLOR: [u8; 4] = [255, 255, 255, 179];
pub const DEFAULT_CONTAINER: (u32, u32) = (512, 512);

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrushConfig {
    pub diameter: f32,
    pub color: [u8; 4],
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: Option<GeminiConfig>,
    pub brush: BrushConfig,
    pub container: (u32, u32),
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: None,
            endpoint: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok();
        let model = env::var("GEMINI_MODEL").ok();
        let endpoint = env::var("GEMINI_ENDPOINT").ok();

        GeminiConfig {
            api_key,
            model,
            endpoint,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_ENDPOINT)
            .trim_end_matches('/')
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        BrushConfig {
            diameter: DEFAULT_BRUSH_DIAMETER,
            color: DEFAULT_BRUSH_COLOR,
        }
    }
}

impl BrushConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diameter(mut self, diameter: f32) -> Self {
        self.diameter = diameter;
        self
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini: None,
            brush: BrushConfig::default(),
            container: DEFAULT_CONTAINER,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let diameter = env::var("RINPAINT_BRUSH_SIZE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_BRUSH_DIAMETER);
        let container = env::var("RINPAINT_CONTAINER")
            .ok()
            .and_then(|s| parse_dimensions(&s))
            .unwrap_or(DEFAULT_CONTAINER);

        Config {
            gemini: Some(GeminiConfig::from_env()),
            brush: BrushConfig::default().with_diameter(diameter),
            container,
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = Some(config);
        self
    }

    pub fn with_brush(mut self, brush: BrushConfig) -> Self {
        self.brush = brush;
        self
    }

    pub fn with_container(mut self, width: u32, height: u32) -> Self {
        self.container = (width, height);
        self
    }
}

/// Parses `WxH` (e.g. `800x600`).
pub fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.trim().split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}
