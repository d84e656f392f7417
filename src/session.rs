use crate::{
    config::Config,
    error::{InpaintError, Precondition, Result},
    gemini::ImageEditor,
    logger::Timer,
    mask::{Brush, Container, MaskSurface, Point},
    models::{EditRequest, EditedImage, SelectedFile, SourceImage},
    view::{EditedPane, OriginalPane, SessionView},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the session is in the select, paint, submit cycle.
///
/// Prompt edits, strokes and clearing never change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditState {
    /// No image selected yet.
    Idle,
    /// An image is loaded and a submission may be attempted.
    Ready,
    /// A remote edit is in flight; further submissions are refused.
    Submitting,
    /// The last edit returned an image, now held as the result.
    Succeeded,
    /// The last edit failed; the error line holds the reason. Retrying is
    /// allowed.
    Failed,
}

/// Coordinates image selection, mask painting, prompt entry and the remote
/// edit call.
///
/// `submit` borrows the session mutably across the remote call, so at most
/// one edit is ever in flight. Hosts that need to render while the call is
/// pending can drive [`start_submission`](Self::start_submission) and
/// [`complete_submission`](Self::complete_submission) themselves.
pub struct EditSession<E: ImageEditor> {
    id: String,
    editor: E,
    state: EditState,
    source: Option<SourceImage>,
    prompt: String,
    surface: MaskSurface,
    result: Option<EditedImage>,
    error: Option<String>,
}

impl<E: ImageEditor> EditSession<E> {
    pub fn new(editor: E, config: &Config) -> Self {
        let container = Container::from(config.container);
        Self {
            id: Uuid::new_v4().to_string(),
            editor,
            state: EditState::Idle,
            source: None,
            prompt: String::new(),
            surface: MaskSurface::new(container, Brush::from(&config.brush)),
            result: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn result(&self) -> Option<&EditedImage> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn surface(&self) -> &MaskSurface {
        &self.surface
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Loads a new original. Any previous result, error and mask are
    /// dropped, and the session moves to `Ready`. A non-image or
    /// undecodable file leaves everything as it was apart from the error
    /// line.
    pub fn select_image(&mut self, file: SelectedFile) -> Result<()> {
        if !file.is_image() {
            log::debug!(
                session = self.id.as_str();
                "Rejected {} with type {:?}", file.name, file.mime_type
            );
            return Err(self.reject(InpaintError::InvalidFileType(file.mime_type)));
        }
        let source = match SourceImage::decode(file) {
            Ok(source) => source,
            Err(e) => return Err(self.reject(e)),
        };

        log::info!(
            session = self.id.as_str();
            "Loaded {} ({}x{}, {})",
            source.name(),
            source.width(),
            source.height(),
            source.mime_type()
        );
        self.error = None;
        self.result = None;
        self.surface.load(source.width(), source.height());
        self.source = Some(source);
        self.transition(EditState::Ready);
        Ok(())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn resize(&mut self, container: Container) {
        self.surface.resize(container);
    }

    pub fn begin_stroke(&mut self, position: Point) {
        self.surface.begin_stroke(position);
    }

    pub fn extend_stroke(&mut self, position: Point) {
        self.surface.extend_stroke(position);
    }

    pub fn end_stroke(&mut self) {
        self.surface.end_stroke();
    }

    /// Erases the mask. State, prompt and result are untouched.
    pub fn clear_mask(&mut self) {
        self.surface.clear();
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.state != EditState::Submitting && self.source.is_some() && !self.prompt.is_empty()
    }

    /// Runs one edit attempt end to end.
    pub async fn submit(&mut self) -> Result<&EditedImage> {
        let request = self.start_submission()?;
        let _timer = Timer::for_session("image edit", &self.id);
        let outcome = self.editor.edit(&request).await;
        self.complete_submission(outcome)
    }

    /// Validates the preconditions, enters `Submitting` and returns the
    /// request to send.
    pub fn start_submission(&mut self) -> Result<EditRequest> {
        if self.state == EditState::Submitting {
            return Err(InpaintError::InvalidState(
                "an edit is already in progress".into(),
            ));
        }
        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => return Err(self.reject(e)),
        };

        self.error = None;
        self.result = None;
        self.transition(EditState::Submitting);
        Ok(request)
    }

    /// Applies the remote outcome of the pending submission.
    ///
    /// An outcome arriving after a new image was selected is discarded.
    pub fn complete_submission(&mut self, outcome: Result<EditedImage>) -> Result<&EditedImage> {
        if self.state != EditState::Submitting {
            log::warn!(session = self.id.as_str(); "Discarding edit result for a stale submission");
            return Err(InpaintError::InvalidState(
                "no edit is in progress".into(),
            ));
        }

        match outcome {
            Ok(edited) => {
                log::info!(
                    session = self.id.as_str();
                    "Edit succeeded ({}, {} bytes)",
                    edited.mime_type,
                    edited.bytes.len()
                );
                self.transition(EditState::Succeeded);
                let edited: &EditedImage = self.result.insert(edited);
                Ok(edited)
            }
            Err(e) => {
                let err = InpaintError::RemoteEditFailure(e.to_string());
                log::error!(session = self.id.as_str(); "{}", err);
                self.error = Some(err.to_string());
                self.transition(EditState::Failed);
                Err(err)
            }
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        let submitting = self.state == EditState::Submitting;
        let loaded = self.source.is_some();

        SessionView {
            select_label: if loaded { "Change Image" } else { "Select Image" },
            selected_name: self.source.as_ref().map(SourceImage::name),
            prompt_enabled: loaded,
            clear_enabled: loaded && !submitting,
            submit_enabled: self.can_submit(),
            submit_label: if submitting { "Generating..." } else { "Apply Edit" },
            original: match &self.source {
                Some(source) => OriginalPane::Image {
                    source,
                    rendered: self.surface.rendered_box(),
                },
                None => OriginalPane::Placeholder,
            },
            edited: match (&self.result, submitting) {
                (_, true) => EditedPane::Loading,
                (Some(edited), false) => EditedPane::Image(edited),
                (None, false) => EditedPane::Placeholder,
            },
            error: self.error.as_deref(),
        }
    }

    fn build_request(&self) -> Result<EditRequest> {
        let source = self
            .source
            .as_ref()
            .ok_or(InpaintError::MissingPrecondition(Precondition::NoImage))?;
        if self.prompt.trim().is_empty() {
            return Err(InpaintError::MissingPrecondition(Precondition::EmptyPrompt));
        }
        if !self.surface.is_marked() {
            return Err(InpaintError::MissingPrecondition(Precondition::EmptyMask));
        }
        let mask = self
            .surface
            .export_mask()?
            .ok_or(InpaintError::MissingPrecondition(Precondition::NoImage))?;

        Ok(EditRequest {
            image: source.clone(),
            mask,
            prompt: self.prompt.clone(),
        })
    }

    // Records a validation error as the visible message; state is unchanged.
    fn reject(&mut self, err: InpaintError) -> InpaintError {
        log::warn!(session = self.id.as_str(); "{}", err);
        self.error = Some(err.to_string());
        err
    }

    fn transition(&mut self, next: EditState) {
        if self.state != next {
            log::info!(
                session = self.id.as_str(), state:? = next;
                "{:?} -> {:?}", self.state, next
            );
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;
    use std::sync::Mutex;

    enum Outcome {
        Succeed(EditedImage),
        Fail(String),
    }

    struct MockEditor {
        outcome: Outcome,
        prompts: Mutex<Vec<String>>,
    }

    impl MockEditor {
        fn succeeding() -> Self {
            Self {
                outcome: Outcome::Succeed(EditedImage::new("image/png", vec![9, 9, 9])),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                outcome: Outcome::Fail(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageEditor for MockEditor {
        async fn edit(&self, request: &EditRequest) -> Result<EditedImage> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            match &self.outcome {
                Outcome::Succeed(edited) => Ok(edited.clone()),
                Outcome::Fail(message) => Err(InpaintError::ApiError(message.clone())),
            }
        }
    }

    fn png_file(width: u32, height: u32) -> SelectedFile {
        let mut bytes = Vec::new();
        RgbaImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        SelectedFile::new("photo.png", "image/png", bytes)
    }

    fn session(editor: MockEditor) -> EditSession<MockEditor> {
        EditSession::new(editor, &Config::new().with_container(100, 100))
    }

    fn paint(session: &mut EditSession<MockEditor>) {
        session.begin_stroke(Point::new(30.0, 30.0));
        session.extend_stroke(Point::new(60.0, 40.0));
        session.end_stroke();
    }

    fn ready_session(editor: MockEditor) -> EditSession<MockEditor> {
        let mut session = session(editor);
        session.select_image(png_file(100, 100)).unwrap();
        paint(&mut session);
        session.set_prompt("add sunglasses");
        session
    }

    #[test]
    fn test_select_image_moves_to_ready() {
        let mut session = session(MockEditor::succeeding());
        assert_eq!(session.state(), EditState::Idle);

        session.select_image(png_file(100, 100)).unwrap();
        assert_eq!(session.state(), EditState::Ready);
        assert_eq!(session.surface().layer().unwrap().dimensions(), (100, 100));
        assert!(!session.surface().scan_marked());
    }

    #[test]
    fn test_non_image_file_rejected() {
        let mut session = session(MockEditor::succeeding());
        let err = session
            .select_image(SelectedFile::new("notes.txt", "text/plain", b"hi".to_vec()))
            .unwrap_err();
        assert!(matches!(err, InpaintError::InvalidFileType(_)));
        assert_eq!(session.state(), EditState::Idle);
        assert_eq!(
            session.error_message(),
            Some("Please upload a valid image file (JPEG, PNG, GIF, etc.).")
        );

        // a later valid selection dismisses the message
        session.select_image(png_file(10, 10)).unwrap();
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_undecodable_image_keeps_previous_state() {
        let mut session = session(MockEditor::succeeding());
        session.select_image(png_file(20, 20)).unwrap();
        let err = session
            .select_image(SelectedFile::new("bad.png", "image/png", vec![0, 1, 2]))
            .unwrap_err();
        assert!(matches!(err, InpaintError::ImageDecodeError(_)));
        assert_eq!(session.state(), EditState::Ready);
        assert_eq!(session.source().unwrap().width(), 20);
    }

    #[tokio::test]
    async fn test_submit_without_image() {
        let mut session = session(MockEditor::succeeding());
        session.set_prompt("add sunglasses");
        let err = session.submit().await.unwrap_err();
        assert!(matches!(
            err,
            InpaintError::MissingPrecondition(Precondition::NoImage)
        ));
        assert_eq!(session.state(), EditState::Idle);
        assert_eq!(session.editor().calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_with_blank_prompt() {
        let mut session = ready_session(MockEditor::succeeding());
        session.set_prompt("   \n\t");
        let err = session.submit().await.unwrap_err();
        assert!(matches!(
            err,
            InpaintError::MissingPrecondition(Precondition::EmptyPrompt)
        ));
        assert_eq!(session.state(), EditState::Ready);
        assert_eq!(
            session.error_message(),
            Some(Precondition::EmptyPrompt.message())
        );
        assert_eq!(session.editor().calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_with_empty_mask() {
        let mut session = ready_session(MockEditor::succeeding());
        session.clear_mask();
        assert_eq!(session.state(), EditState::Ready);

        let err = session.submit().await.unwrap_err();
        assert!(matches!(
            err,
            InpaintError::MissingPrecondition(Precondition::EmptyMask)
        ));
        assert_eq!(session.state(), EditState::Ready);
        assert_eq!(session.editor().calls(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_success() {
        let mut session = ready_session(MockEditor::succeeding());
        let edited = session.submit().await.unwrap().clone();

        assert_eq!(edited, EditedImage::new("image/png", vec![9, 9, 9]));
        assert_eq!(session.state(), EditState::Succeeded);
        assert_eq!(session.view().edited, EditedPane::Image(&edited));
        assert!(session.error_message().is_none());
        assert_eq!(
            session.editor().prompts.lock().unwrap().as_slice(),
            ["add sunglasses".to_string()]
        );
    }

    #[tokio::test]
    async fn test_end_to_end_failure() {
        let mut session = ready_session(MockEditor::failing("quota exceeded"));
        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, InpaintError::RemoteEditFailure(_)));
        assert_eq!(session.state(), EditState::Failed);
        let message = session.error_message().unwrap();
        assert!(message.starts_with("Failed to edit image: "));
        assert!(message.contains("quota exceeded"));
        assert_eq!(session.view().edited, EditedPane::Placeholder);

        // retry is allowed straight away
        assert!(session.can_submit());
        assert!(session.submit().await.is_err());
        assert_eq!(session.editor().calls(), 2);
    }

    #[tokio::test]
    async fn test_new_image_discards_result() {
        let mut session = ready_session(MockEditor::succeeding());
        session.submit().await.unwrap();
        assert!(session.result().is_some());

        session.select_image(png_file(50, 50)).unwrap();
        assert_eq!(session.state(), EditState::Ready);
        assert!(session.result().is_none());
        assert!(!session.surface().is_marked());
        // prompt survives a new selection
        assert_eq!(session.prompt(), "add sunglasses");
    }

    #[test]
    fn test_submitting_view_and_single_flight() {
        let mut session = ready_session(MockEditor::succeeding());
        let request = session.start_submission().unwrap();
        assert_eq!(request.prompt, "add sunglasses");
        assert_eq!((request.mask.width, request.mask.height), (100, 100));

        let view = session.view();
        assert_eq!(view.edited, EditedPane::Loading);
        assert_eq!(view.submit_label, "Generating...");
        assert!(!view.submit_enabled);
        assert!(!view.clear_enabled);

        assert!(matches!(
            session.start_submission(),
            Err(InpaintError::InvalidState(_))
        ));

        session
            .complete_submission(Ok(EditedImage::new("image/webp", vec![1])))
            .unwrap();
        assert_eq!(session.state(), EditState::Succeeded);
    }

    #[test]
    fn test_request_carries_source_and_raw_prompt() {
        let file = png_file(100, 100);
        let original = file.bytes.clone();
        let mut session = session(MockEditor::succeeding());
        session.select_image(file).unwrap();
        paint(&mut session);
        session.set_prompt("  add sunglasses  ");

        let request = session.start_submission().unwrap();
        assert_eq!(request.image.bytes(), original.as_slice());
        assert_eq!(request.image.mime_type(), "image/png");
        assert_eq!(request.prompt, "  add sunglasses  ");
        assert_eq!(request.mask.mime_type(), "image/png");
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let mut session = ready_session(MockEditor::succeeding());
        session.start_submission().unwrap();
        session.select_image(png_file(40, 40)).unwrap();

        let outcome = session.complete_submission(Ok(EditedImage::new("image/png", vec![1])));
        assert!(matches!(outcome, Err(InpaintError::InvalidState(_))));
        assert_eq!(session.state(), EditState::Ready);
        assert!(session.result().is_none());
    }

    #[test]
    fn test_prompt_and_clear_do_not_change_state() {
        let mut session = session(MockEditor::succeeding());
        session.set_prompt("x");
        session.clear_mask();
        assert_eq!(session.state(), EditState::Idle);

        session.select_image(png_file(10, 10)).unwrap();
        session.set_prompt("");
        session.clear_mask();
        assert_eq!(session.state(), EditState::Ready);
    }

    #[test]
    fn test_view_before_and_after_load() {
        let mut session = session(MockEditor::succeeding());
        let view = session.view();
        assert_eq!(view.select_label, "Select Image");
        assert_eq!(view.original, OriginalPane::Placeholder);
        assert!(!view.prompt_enabled);
        assert!(!view.submit_enabled);

        session.select_image(png_file(200, 100)).unwrap();
        let view = session.view();
        assert_eq!(view.select_label, "Change Image");
        assert_eq!(view.selected_name, Some("photo.png"));
        assert!(view.prompt_enabled);
        assert!(view.clear_enabled);
        // the raw prompt is still empty
        assert!(!view.submit_enabled);
        match view.original {
            OriginalPane::Image { rendered, .. } => {
                let rendered = rendered.unwrap();
                assert_eq!((rendered.width, rendered.height), (100, 50));
            }
            OriginalPane::Placeholder => panic!("expected image pane"),
        }
    }

    #[test]
    fn test_resize_realigns_mask() {
        let mut session = ready_session(MockEditor::succeeding());
        assert!(session.surface().is_marked());

        session.resize(Container::new(50, 50));
        assert_eq!(session.surface().layer().unwrap().dimensions(), (50, 50));
        assert!(!session.surface().is_marked());
        assert_eq!(session.state(), EditState::Ready);
    }
}
