//! Mask-driven image editing.
//!
//! Load an image into an [`EditSession`], paint a mask over the region to
//! change, describe the change, and submit. The session rasterizes the mask
//! onto a layer aligned with the displayed image, encodes it as PNG and sends
//! image, mask and prompt to an [`ImageEditor`] such as [`GeminiClient`].

pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod mask;
pub mod models;
pub mod session;
pub mod view;

pub use config::{BrushConfig, Config, GeminiConfig};
pub use error::{InpaintError, Precondition, Result};
pub use gemini::{GeminiClient, ImageClient, ImageEditor};
pub use mask::{Brush, Container, MaskLayer, MaskSurface, Point, RenderedBox};
pub use models::{EditRequest, EditedImage, MaskPayload, SelectedFile, SourceImage};
pub use session::{EditSession, EditState};
pub use view::{EditedPane, OriginalPane, SessionView};
