use iced::widget::image::Handle;
use iced::widget::{
    button, canvas, column, container, pick_list, row, scrollable, slider, text, text_input,
};
use iced::{Alignment, Element, Event, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;

// Declare the application modules
mod imaging;
mod remote;
mod state;
mod ui;

use imaging::{codec, compositor, ImagingError};
use remote::client::{EditClient, EditError};
use state::data::{EditResult, OutputFormat, SourceImage};
use state::edit::{AnchorPosition, FilterSpec, FontFamily, TextOverlaySpec};
use state::prefs::Preferences;
use state::viewport::ViewTransform;
use ui::viewer::{ImagePane, Pane, PaneEvent};

/// Canned instruction behind the one-click Auto Enhance button.
/// Substitutes for typed prompt text when the user just wants a cleanup.
const AUTO_ENHANCE_PROMPT: &str = "Automatically enhance this photo: improve lighting, \
     color balance and sharpness while keeping it natural.";

/// The edited image as currently displayed
struct EditedDisplay {
    /// Raw bytes exactly as the service returned them; filters and
    /// overlays never modify these
    bytes: Vec<u8>,
    /// Mime type the service reported
    mime_type: String,
    /// Handle for the raw edited image
    handle: Handle,
    /// Handle with filters/overlay baked in, present while any are active
    preview: Option<Handle>,
}

impl EditedDisplay {
    fn new(bytes: Vec<u8>, mime_type: String) -> Self {
        EditedDisplay {
            handle: Handle::from_bytes(bytes.clone()),
            preview: None,
            bytes,
            mime_type,
        }
    }

    /// What the edited pane should show right now
    fn display_handle(&self) -> &Handle {
        self.preview.as_ref().unwrap_or(&self.handle)
    }
}

/// Main application state
struct PhotoEditor {
    /// Client for the remote editing service
    client: EditClient,
    /// Persisted output-format preference
    prefs: Preferences,

    /// The uploaded photo, if any
    source: Option<SourceImage>,
    /// Decoded handle for the original pane
    source_handle: Option<Handle>,
    /// The instruction text typed by the user
    prompt: String,
    /// The latest edit result's image, if any
    edited: Option<EditedDisplay>,
    /// Commentary text the service sent alongside (or instead of) an image
    response_text: Option<String>,

    /// Local blur/enhance filters for the edited image
    filters: FilterSpec,
    /// Local text overlay for the edited image
    overlay: TextOverlaySpec,
    /// Target format for saving
    output_format: OutputFormat,

    /// Zoom/pan transform for the original pane
    original_view: ViewTransform,
    /// Zoom/pan transform for the edited pane
    edited_view: ViewTransform,

    /// True while an edit request is in flight
    loading: bool,
    /// User-facing error replacing the display area, if any
    error: Option<String>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Upload Photo" button
    OpenImage,
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    /// The prompt text changed
    PromptChanged(String),
    /// User clicked "Generate"
    Generate,
    /// User clicked "Auto Enhance"
    AutoEnhance,
    /// The remote edit request finished
    EditComplete(Result<EditResult, EditError>),

    /// Blur slider moved
    BlurChanged(f32),
    /// Enhance slider moved
    EnhanceChanged(u8),
    /// Overlay text changed
    OverlayTextChanged(String),
    /// Overlay font selected
    OverlayFontSelected(FontFamily),
    /// Overlay size slider moved
    OverlaySizeChanged(u32),
    /// Overlay color hex field changed
    OverlayColorChanged(String),
    /// Overlay anchor position selected
    OverlayAnchorSelected(AnchorPosition),
    /// Re-render the edited pane with the current filters/overlay
    RefreshPreview,
    /// Background preview render finished
    PreviewReady(Result<Vec<u8>, ImagingError>),

    /// Output format selected
    FormatSelected(OutputFormat),
    /// User clicked "Save Edited Image"
    SaveEdited,
    /// Background save finished
    SaveComplete(Result<PathBuf, String>),
    /// User clicked "Use Edited as Original"
    UseEditedAsSource,

    /// Pointer interaction on one of the image panes
    Pane(Pane, PaneEvent),
    /// Reset one pane's zoom/pan
    ResetView(Pane),
}

impl PhotoEditor {
    /// Create a new instance of the application
    fn new(api_key: String) -> (Self, Task<Message>) {
        let prefs = Preferences::new();
        let output_format = prefs.load_output_format();

        println!("🎨 AI Photo Editor ready (saving as {})", output_format);

        (
            PhotoEditor {
                client: EditClient::new(api_key),
                prefs,
                source: None,
                source_handle: None,
                prompt: String::new(),
                edited: None,
                response_text: None,
                filters: FilterSpec::new(),
                overlay: TextOverlaySpec::default(),
                output_format,
                original_view: ViewTransform::new(),
                edited_view: ViewTransform::new(),
                loading: false,
                error: None,
                status: "Upload a photo to get started.".to_string(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenImage => {
                // Show the native file picker dialog
                let file = FileDialog::new()
                    .set_title("Select a Photo")
                    .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
                    .pick_file();

                match file {
                    Some(path) => self.load_image(&path),
                    None => Task::none(),
                }
            }
            Message::FileDropped(path) => self.load_image(&path),
            Message::PromptChanged(prompt) => {
                self.prompt = prompt;
                Task::none()
            }
            Message::Generate => self.start_generation(self.prompt.clone()),
            Message::AutoEnhance => self.start_generation(AUTO_ENHANCE_PROMPT.to_string()),
            Message::EditComplete(result) => {
                // Loading is cleared no matter how the request ended
                self.loading = false;

                match result {
                    Ok(result) => {
                        self.response_text = result.text;
                        // Fresh result, fresh filters
                        self.filters.reset();

                        match result.image {
                            Some(image) => {
                                println!("✅ Received edited image ({})", image.mime_type);
                                self.edited =
                                    Some(EditedDisplay::new(image.bytes, image.mime_type));
                                self.status = "Edit complete.".to_string();
                            }
                            None => {
                                // Soft failure: a valid response without pixels
                                self.error = Some(
                                    "The AI did not return an image. It might have refused \
                                     the request. Try a different prompt."
                                        .to_string(),
                                );
                                self.status = "No image returned.".to_string();
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("❌ Edit failed: {}", e);
                        self.error = Some(e.to_string());
                        self.status = "Edit failed.".to_string();
                    }
                }

                Task::none()
            }

            Message::BlurChanged(radius) => {
                self.filters.set_blur(radius);
                Task::none()
            }
            Message::EnhanceChanged(level) => {
                self.filters.set_enhance(level);
                Task::none()
            }
            Message::OverlayTextChanged(text) => {
                self.overlay.text = text;
                self.refresh_preview()
            }
            Message::OverlayFontSelected(font) => {
                self.overlay.font = font;
                self.refresh_preview()
            }
            Message::OverlaySizeChanged(size) => {
                self.overlay.set_size(size);
                Task::none()
            }
            Message::OverlayColorChanged(color) => {
                self.overlay.color = color;
                self.refresh_preview()
            }
            Message::OverlayAnchorSelected(anchor) => {
                self.overlay.anchor = anchor;
                self.refresh_preview()
            }
            Message::RefreshPreview => self.refresh_preview(),
            Message::PreviewReady(result) => {
                match result {
                    Ok(bytes) => {
                        if let Some(edited) = &mut self.edited {
                            edited.preview = Some(Handle::from_bytes(bytes));
                        }
                    }
                    Err(e) => {
                        eprintln!("⚠️  Preview render failed: {}", e);
                        self.error = Some(e.to_string());
                    }
                }
                Task::none()
            }

            Message::FormatSelected(format) => {
                self.output_format = format;
                // Written through on every change; failure is not fatal
                if let Err(e) = self.prefs.save_output_format(format) {
                    eprintln!("⚠️  {}", e);
                }
                Task::none()
            }
            Message::SaveEdited => {
                let Some(edited) = &self.edited else {
                    return Task::none();
                };

                // Show the native save dialog
                let path = FileDialog::new()
                    .set_title("Save Edited Image")
                    .set_file_name(self.output_format.download_name())
                    .add_filter(
                        self.output_format.to_string(),
                        &[self.output_format.extension()],
                    )
                    .save_file();

                let Some(path) = path else {
                    return Task::none();
                };

                self.status = "Saving...".to_string();

                Task::perform(
                    save_edited_async(
                        path,
                        edited.bytes.clone(),
                        self.filters,
                        self.overlay.clone(),
                        self.output_format,
                    ),
                    Message::SaveComplete,
                )
            }
            Message::SaveComplete(result) => {
                match result {
                    Ok(path) => {
                        println!("💾 Saved {}", path.display());
                        self.status = format!("Saved {}", path.display());
                    }
                    Err(e) => {
                        self.error = Some(e);
                        self.status = "Save failed.".to_string();
                    }
                }
                Task::none()
            }
            Message::UseEditedAsSource => {
                let Some(edited) = &self.edited else {
                    return Task::none();
                };

                // Round-trip through the codec's data URL path so the
                // edited bytes re-enter the normal upload flow
                let url = codec::to_data_url(&edited.mime_type, &edited.bytes);
                let filename =
                    format!("edited-image.{}", codec::extension_for_mime(&edited.mime_type));

                match codec::source_from_data_url(&url, &filename) {
                    Ok(source) => {
                        self.install_source(source);
                        self.status = "Edited image is now the original.".to_string();
                    }
                    Err(e) => {
                        // Keep the still-valid edit result on screen
                        eprintln!("⚠️  Could not reuse edited image: {}", e);
                        self.error = Some(e.to_string());
                    }
                }

                Task::none()
            }

            Message::Pane(pane, event) => {
                let view = match pane {
                    Pane::Original => &mut self.original_view,
                    Pane::Edited => &mut self.edited_view,
                };
                match event {
                    PaneEvent::Pressed(position) => view.pointer_pressed(position),
                    PaneEvent::Moved(position) => view.pointer_moved(position),
                    PaneEvent::Released => view.pointer_released(),
                    PaneEvent::Wheel(delta_y) => view.wheel(delta_y),
                }
                Task::none()
            }
            Message::ResetView(pane) => {
                match pane {
                    Pane::Original => self.original_view.reset(),
                    Pane::Edited => self.edited_view.reset(),
                }
                Task::none()
            }
        }
    }

    /// Load an image file and make it the current original
    fn load_image(&mut self, path: &std::path::Path) -> Task<Message> {
        match codec::load_source(path) {
            Ok(source) => {
                println!(
                    "📷 Loaded {} ({}x{}, {})",
                    source.filename, source.width, source.height, source.mime_type
                );
                self.install_source(source);
            }
            Err(e) => {
                eprintln!("❌ Could not load {}: {}", path.display(), e);
                self.error = Some(e.to_string());
            }
        }
        Task::none()
    }

    /// Make a source image current, clearing per-image state.
    ///
    /// Overlay styling and the output format are user preferences and
    /// survive; the overlay text itself does not.
    fn install_source(&mut self, source: SourceImage) {
        self.source_handle = Some(Handle::from_bytes(source.bytes.clone()));
        self.status = format!(
            "{} ({}x{}) ready to edit.",
            source.filename, source.width, source.height
        );
        self.source = Some(source);
        self.edited = None;
        self.response_text = None;
        self.error = None;
        self.prompt.clear();
        self.filters.reset();
        self.overlay.text.clear();
        self.original_view.reset();
        self.edited_view.reset();
    }

    /// Validate and launch one edit request
    fn start_generation(&mut self, instruction: String) -> Task<Message> {
        if self.loading {
            // The buttons are disabled while loading; this is a guard,
            // not a lock
            return Task::none();
        }

        let Some(source) = &self.source else {
            self.error = Some("Please upload an image and enter a prompt.".to_string());
            return Task::none();
        };
        if instruction.trim().is_empty() {
            self.error = Some("Please upload an image and enter a prompt.".to_string());
            return Task::none();
        }

        self.loading = true;
        self.error = None;
        self.edited = None;
        self.response_text = None;
        self.status = "Asking the AI for an edit...".to_string();
        println!("✨ Requesting edit: {}", instruction.trim());

        Task::perform(
            self.client.clone().edit_image(
                source.bytes.clone(),
                source.mime_type.clone(),
                instruction,
            ),
            Message::EditComplete,
        )
    }

    /// Launch a background render of the edited pane's preview
    fn refresh_preview(&mut self) -> Task<Message> {
        let Some(edited) = &mut self.edited else {
            return Task::none();
        };

        // Nothing active: show the raw edited image again
        if self.filters.is_identity() && self.overlay.is_empty() {
            edited.preview = None;
            return Task::none();
        }

        // Preview always renders as PNG; the output format only
        // matters when saving
        Task::perform(
            compositor::render_task(
                edited.bytes.clone(),
                self.filters,
                self.overlay.clone(),
                OutputFormat::Png,
            ),
            Message::PreviewReady,
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let controls = self.view_controls();
        let display = self.view_display();

        row![
            scrollable(container(controls).padding(20).width(320)),
            container(display)
                .padding(20)
                .width(Length::Fill)
                .height(Length::Fill),
        ]
        .into()
    }

    /// The left-hand control column
    fn view_controls(&self) -> Element<Message> {
        let has_edit = self.edited.is_some();
        let idle = !self.loading;

        let upload = column![
            text("1. Upload Photo").size(20),
            button("Upload Photo").on_press(Message::OpenImage).padding(10),
            text(match &self.source {
                Some(source) => format!("{} ({}x{})", source.filename, source.width, source.height),
                None => "...or drop an image onto the window".to_string(),
            })
            .size(13),
        ]
        .spacing(8);

        let prompt = column![
            text("2. Describe Edit").size(20),
            text_input("e.g. Make the sky a vibrant sunset", &self.prompt)
                .on_input(Message::PromptChanged)
                .padding(8),
            row![
                button(text(if self.loading { "Generating..." } else { "Generate" }))
                    .on_press_maybe(idle.then_some(Message::Generate))
                    .padding(10),
                button("Auto Enhance")
                    .on_press_maybe(idle.then_some(Message::AutoEnhance))
                    .padding(10),
            ]
            .spacing(8),
        ]
        .spacing(8);

        let filters = column![
            text("3. Adjust").size(20),
            text(format!("Blur: {:.1}px", self.filters.blur)).size(13),
            slider(0.0..=FilterSpec::MAX_BLUR, self.filters.blur, Message::BlurChanged)
                .step(0.1)
                .on_release(Message::RefreshPreview),
            text(format!("Enhance: {}", self.filters.enhance)).size(13),
            slider(0..=FilterSpec::MAX_ENHANCE, self.filters.enhance, Message::EnhanceChanged)
                .on_release(Message::RefreshPreview),
        ]
        .spacing(8);

        let overlay = column![
            text("4. Text Overlay").size(20),
            text_input("Overlay text", &self.overlay.text)
                .on_input(Message::OverlayTextChanged)
                .padding(8),
            pick_list(
                FontFamily::ALL,
                Some(self.overlay.font),
                Message::OverlayFontSelected
            ),
            text(format!("Size: {}px", self.overlay.size_px)).size(13),
            slider(
                TextOverlaySpec::MIN_SIZE..=TextOverlaySpec::MAX_SIZE,
                self.overlay.size_px,
                Message::OverlaySizeChanged
            )
            .on_release(Message::RefreshPreview),
            text_input("#FFFFFF", &self.overlay.color)
                .on_input(Message::OverlayColorChanged)
                .padding(8),
            pick_list(
                AnchorPosition::ALL,
                Some(self.overlay.anchor),
                Message::OverlayAnchorSelected
            ),
        ]
        .spacing(8);

        let output = column![
            text("5. Save").size(20),
            pick_list(
                OutputFormat::ALL,
                Some(self.output_format),
                Message::FormatSelected
            ),
            button("Save Edited Image")
                .on_press_maybe(has_edit.then_some(Message::SaveEdited))
                .padding(10),
            button("Use Edited as Original")
                .on_press_maybe(has_edit.then_some(Message::UseEditedAsSource))
                .padding(10),
        ]
        .spacing(8);

        column![upload, prompt, filters, overlay, output, text(&self.status).size(13)]
            .spacing(24)
            .into()
    }

    /// The main display area: panes, loader, error or placeholder
    fn view_display(&self) -> Element<Message> {
        if self.loading {
            return container(text("Generating...").size(24))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into();
        }

        if let Some(error) = &self.error {
            return container(
                column![text("Something went wrong").size(24), text(error).size(16)]
                    .spacing(12)
                    .align_x(Alignment::Center),
            )
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
        }

        let Some(source) = &self.source else {
            return container(
                column![
                    text("Your Edited Photo Will Appear Here").size(24),
                    text("Upload a photo and provide an editing prompt to get started.").size(16),
                ]
                .spacing(12)
                .align_x(Alignment::Center),
            )
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
        };

        let original_pane = self.view_pane(
            "Original",
            Pane::Original,
            self.source_handle.as_ref(),
            (source.width, source.height),
            &self.original_view,
        );

        let edited_pane = match &self.edited {
            Some(edited) => self.view_pane(
                "Edited",
                Pane::Edited,
                Some(edited.display_handle()),
                (source.width, source.height),
                &self.edited_view,
            ),
            None => self.view_pane("Edited", Pane::Edited, None, (0, 0), &self.edited_view),
        };

        let panes = row![original_pane, edited_pane]
            .spacing(16)
            .height(Length::Fill);

        let mut content = column![panes].spacing(16);
        if let Some(response) = &self.response_text {
            content = content.push(
                column![text("AI Response:").size(16), text(response).size(14)].spacing(6),
            );
        }

        content.into()
    }

    /// One labelled image pane with its reset button
    fn view_pane<'a>(
        &'a self,
        label: &'a str,
        pane: Pane,
        handle: Option<&'a Handle>,
        image_size: (u32, u32),
        view: &'a ViewTransform,
    ) -> Element<'a, Message> {
        let content: Element<Message> = match handle {
            Some(handle) => canvas(ImagePane {
                pane,
                handle,
                image_size,
                view,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            None => container(text("Awaiting generation...").size(14))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        column![
            row![
                text(label).size(16).width(Length::Fill),
                button(text("Reset View").size(12))
                    .on_press_maybe((!view.is_identity()).then_some(Message::ResetView(pane)))
                    .padding(4),
            ]
            .align_y(Alignment::Center),
            content,
        ]
        .spacing(6)
        .width(Length::Fill)
        .into()
    }

    /// React to window-level events (file drops)
    fn subscription(&self) -> Subscription<Message> {
        iced::event::listen_with(|event, _status, _window| match event {
            Event::Window(iced::window::Event::FileDropped(path)) => {
                Some(Message::FileDropped(path))
            }
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    // The credential is required up front; there is nothing useful the
    // app can do without it
    let api_key = EditClient::api_key_from_env()
        .expect("GEMINI_API_KEY environment variable is not set");

    iced::application("AI Photo Editor", PhotoEditor::update, PhotoEditor::view)
        .theme(PhotoEditor::theme)
        .subscription(PhotoEditor::subscription)
        .centered()
        .run_with(move || PhotoEditor::new(api_key))
}

/// Flatten and write the edited image in the background.
///
/// If the compositor fails for any reason other than an undecodable
/// source, the raw edited bytes are written as-is instead: a degraded
/// save beats a silent failure.
async fn save_edited_async(
    path: PathBuf,
    bytes: Vec<u8>,
    filters: FilterSpec,
    overlay: TextOverlaySpec,
    format: OutputFormat,
) -> Result<PathBuf, String> {
    let encoded = match compositor::render_task(bytes.clone(), filters, overlay, format).await {
        Ok(encoded) => encoded,
        Err(e @ ImagingError::Decode(_)) => return Err(e.to_string()),
        Err(e) => {
            eprintln!("⚠️  Compositor failed ({}), saving the unfiltered image", e);
            bytes
        }
    };

    tokio::fs::write(&path, encoded)
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    Ok(path)
}
