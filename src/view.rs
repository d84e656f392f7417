use crate::mask::RenderedBox;
use crate::models::{EditedImage, SourceImage};

/// The left pane: the loaded original with the mask layer over it.
#[derive(Debug, Clone, PartialEq)]
pub enum OriginalPane<'a> {
    /// "Upload an image to start".
    Placeholder,
    /// `rendered` is where the image, and the mask layer, sit in the
    /// container. `None` while the container has no area.
    Image {
        source: &'a SourceImage,
        rendered: Option<RenderedBox>,
    },
}

/// The right pane.
#[derive(Debug, Clone, PartialEq)]
pub enum EditedPane<'a> {
    Placeholder,
    /// Shown for the whole time an edit is in flight.
    Loading,
    Image(&'a EditedImage),
}

/// What the controls and the two panes show for the current session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView<'a> {
    /// "Select Image" before the first load, "Change Image" after.
    pub select_label: &'static str,
    pub selected_name: Option<&'a str>,
    pub prompt_enabled: bool,
    pub clear_enabled: bool,
    pub submit_enabled: bool,
    /// "Generating..." while submitting, otherwise "Apply Edit".
    pub submit_label: &'static str,
    pub original: OriginalPane<'a>,
    pub edited: EditedPane<'a>,
    /// The single error line, if any.
    pub error: Option<&'a str>,
}
