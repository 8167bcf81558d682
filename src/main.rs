use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_input, Column, Row};
use iced::{Alignment, Element, Length, Task, Theme};
use iced_aw::Wrap;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::sync::Arc;
use tracing::{error, info};

use concern_desk::api::{ConcernApi, HttpConcernApi};
use concern_desk::config::AppConfig;
use concern_desk::dashboard::{Dashboard, NoticeKind, Request, Response};
use concern_desk::state::data::{CommentId, Concern, ConcernId, ConcernStatus, Role};
use concern_desk::state::mutators::Confirmation;
use concern_desk::state::popup::Popup;
use concern_desk::state::resolver::QueryMode;

/// Main application state
struct ConcernDesk {
    /// Concern state and action entry points
    dashboard: Dashboard,
    /// Backend shared with every spawned request
    api: Arc<dyn ConcernApi>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// A backend request finished
    Backend(Response),
    NextPage,
    PreviousPage,
    LocationSelected(String),
    StatusSelected(ConcernStatus),
    ClearFilters,
    SearchChanged(String),
    SearchSubmitted,
    ToggleComments(ConcernId),
    CommentEdited(ConcernId, String),
    CommentSubmitted(ConcernId),
    StatusChangeRequested(ConcernId, ConcernStatus),
    DeleteCommentRequested(ConcernId, CommentId),
    OpenUpload,
    OpenRole,
    ClosePopup,
    UploadTitleChanged(String),
    UploadDescriptionChanged(String),
    UploadImageChanged(String),
    UploadLocationSelected(String),
    /// User clicked "Browse..." in the upload form
    PickImage,
    UploadSubmitted,
    RoleEmailChanged(String),
    RoleSelected(Role),
    RoleSubmitted,
    DismissNotice,
}

/// Spawn a request; its response comes back as `Message::Backend`
fn perform(api: &Arc<dyn ConcernApi>, request: Option<Request>) -> Task<Message> {
    match request {
        Some(request) => Task::perform(request.execute(api.clone()), Message::Backend),
        None => Task::none(),
    }
}

impl ConcernDesk {
    /// Create a new instance of the application and kick off the first load
    fn new(config: AppConfig, api: Arc<dyn ConcernApi>) -> (Self, Task<Message>) {
        let mut dashboard = Dashboard::new(config.session.clone(), config.dashboard_settings());
        info!(
            user = dashboard.session().display_name(),
            role = %dashboard.session().role,
            "concern desk initialized"
        );

        let startup = Task::batch(
            dashboard
                .start()
                .into_iter()
                .map(|request| perform(&api, Some(request))),
        );

        (ConcernDesk { dashboard, api }, startup)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let request = match message {
            Message::Backend(response) => self.dashboard.apply(response),
            Message::NextPage => self.dashboard.next_page(),
            Message::PreviousPage => self.dashboard.previous_page(),
            Message::LocationSelected(location) => Some(self.dashboard.filter_by_location(location)),
            Message::StatusSelected(status) => Some(self.dashboard.filter_by_status(status)),
            Message::ClearFilters => Some(self.dashboard.clear_filters()),
            Message::SearchChanged(term) => self.dashboard.set_search_term(term),
            Message::SearchSubmitted => Some(self.dashboard.submit_search()),
            Message::ToggleComments(id) => self.dashboard.toggle_comment_box(id),
            Message::CommentEdited(id, text) => {
                self.dashboard.edit_comment(id, text);
                None
            }
            Message::CommentSubmitted(id) => self.dashboard.submit_comment(id).ok(),
            Message::StatusChangeRequested(id, status) => self.dashboard.change_status(id, status).ok(),
            Message::DeleteCommentRequested(concern, comment) => {
                let answer = MessageDialog::new()
                    .set_level(MessageLevel::Warning)
                    .set_title("Delete comment")
                    .set_description("Delete this comment? This cannot be undone.")
                    .set_buttons(MessageButtons::YesNo)
                    .show();
                let confirmation = if matches!(answer, MessageDialogResult::Yes) {
                    Confirmation::Confirmed
                } else {
                    Confirmation::Declined
                };
                self.dashboard
                    .delete_comment(concern, comment, confirmation)
                    .ok()
                    .flatten()
            }
            Message::OpenUpload => {
                self.dashboard.open_upload_popup();
                None
            }
            Message::OpenRole => {
                self.dashboard.open_role_popup();
                None
            }
            Message::ClosePopup => {
                self.dashboard.close_popup();
                None
            }
            Message::UploadTitleChanged(value) => {
                if let Some(form) = self.dashboard.upload_form_mut() {
                    form.title = value;
                }
                None
            }
            Message::UploadDescriptionChanged(value) => {
                if let Some(form) = self.dashboard.upload_form_mut() {
                    form.description = value;
                }
                None
            }
            Message::UploadImageChanged(value) => {
                if let Some(form) = self.dashboard.upload_form_mut() {
                    form.image_url = value;
                }
                None
            }
            Message::UploadLocationSelected(value) => {
                if let Some(form) = self.dashboard.upload_form_mut() {
                    form.location = value;
                }
                None
            }
            Message::PickImage => {
                // Show the native file picker dialog
                let picked = FileDialog::new()
                    .set_title("Select an image of the concern")
                    .add_filter("Images", &["jpg", "jpeg", "png", "webp"])
                    .pick_file();
                if let (Some(path), Some(form)) = (picked, self.dashboard.upload_form_mut()) {
                    form.image_url = path.display().to_string();
                }
                None
            }
            Message::UploadSubmitted => self.dashboard.submit_upload().ok(),
            Message::RoleEmailChanged(value) => {
                if let Some(form) = self.dashboard.role_form_mut() {
                    form.email = value;
                }
                None
            }
            Message::RoleSelected(role) => {
                if let Some(form) = self.dashboard.role_form_mut() {
                    form.role = role;
                }
                None
            }
            Message::RoleSubmitted => self.dashboard.submit_role_change().ok(),
            Message::DismissNotice => {
                self.dashboard.dismiss_notice();
                None
            }
        };

        perform(&self.api, request)
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let session = self.dashboard.session();

        let header = row![
            text("Concern Desk").size(32),
            text(format!("Signed in as {} ({})", session.display_name(), session.role)).size(14),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let mut content: Column<Message> = column![header].spacing(16).padding(24);

        if let Some(banner) = self.dashboard.banner() {
            content = content.push(container(text(banner).size(16)).padding(8).style(container::rounded_box));
        }

        if let Some(notice) = self.dashboard.notice() {
            let marker = match notice.kind {
                NoticeKind::Info => "✅",
                NoticeKind::Error => "⚠️",
            };
            content = content.push(
                row![
                    text(format!("{marker} {} · {}", notice.text, notice.at.format("%H:%M:%S"))).size(14),
                    button("Dismiss").on_press(Message::DismissNotice),
                ]
                .spacing(12)
                .align_y(Alignment::Center),
            );
        }

        if let Some(popup) = self.popup_view() {
            return container(content.push(popup))
                .width(Length::Fill)
                .height(Length::Fill)
                .into();
        }

        content = content.push(self.toolbar());
        content = content.push(self.summary());

        let cards: Vec<Element<Message>> = self
            .dashboard
            .window()
            .displayed()
            .iter()
            .map(|concern| self.concern_card(concern))
            .collect();
        if cards.is_empty() {
            content = content.push(text("No concerns to show.").size(16));
        } else {
            content = content.push(Wrap::with_elements(cards).spacing(12.0).line_spacing(12.0));
        }

        if self.dashboard.mode() == QueryMode::AllPaged {
            content = content.push(self.paging());
        }

        container(scrollable(content))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn toolbar(&self) -> Element<Message> {
        let role = self.dashboard.session().role;
        row![
            pick_list(
                self.dashboard.locations(),
                self.dashboard.selected_location().map(str::to_owned),
                Message::LocationSelected,
            )
            .placeholder("Location"),
            pick_list(
                ConcernStatus::ASSIGNABLE,
                self.dashboard.selected_status(),
                Message::StatusSelected,
            )
            .placeholder("Status"),
            button("All concerns").on_press(Message::ClearFilters),
            text_input("Search concerns", self.dashboard.search_term())
                .on_input(Message::SearchChanged)
                .on_submit(Message::SearchSubmitted)
                .width(Length::Fixed(260.0)),
            button("Report a concern").on_press(Message::OpenUpload),
            button("Change role").on_press_maybe(role.can_manage_roles().then_some(Message::OpenRole)),
        ]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
    }

    fn summary(&self) -> Element<Message> {
        let window = self.dashboard.window();
        let counts = self.dashboard.counts();
        let mut summary: Row<Message> = row![text(format!(
            "Showing {} of {} concerns",
            counts.total(),
            window.total_count()
        ))
        .size(14)]
        .spacing(16);
        for (status, count) in counts.iter() {
            summary = summary.push(text(format!("{status}: {count}")).size(14));
        }
        summary.into()
    }

    fn paging(&self) -> Element<Message> {
        let window = self.dashboard.window();
        let page_count = window.page_count().max(1);
        let current = window.current_page();
        row![
            button("Previous").on_press_maybe((current > 0).then_some(Message::PreviousPage)),
            text(format!("Page {} of {}", current + 1, page_count)).size(14),
            button("Next").on_press_maybe((current + 1 < page_count).then_some(Message::NextPage)),
        ]
        .spacing(12)
        .align_y(Alignment::Center)
        .into()
    }

    fn concern_card<'a>(&'a self, concern: &'a Concern) -> Element<'a, Message> {
        let id = concern.id;
        let pending = self.dashboard.is_pending(id);
        let can_moderate = self.dashboard.session().role.can_moderate();

        let mut card: Column<Message> = column![
            text(concern.title.as_str()).size(20),
            text(concern.description.as_str()).size(14),
            text(format!("📍 {}", concern.location)).size(13),
        ]
        .spacing(6);

        if let Some(image) = &concern.image_url {
            card = card.push(text(format!("🖼 {image}")).size(12));
        }

        if can_moderate && !pending {
            card = card.push(
                row![
                    text("Status").size(13),
                    pick_list(
                        ConcernStatus::ASSIGNABLE,
                        Some(concern.status).filter(ConcernStatus::is_assignable),
                        move |status| Message::StatusChangeRequested(id, status),
                    ),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
            );
        } else {
            let label = if pending {
                format!("Status: {} (updating...)", concern.status)
            } else {
                format!("Status: {}", concern.status)
            };
            card = card.push(text(label).size(13));
        }

        card = card.push(
            button(text(format!("💬 {} comments", concern.comments_count())).size(13))
                .on_press(Message::ToggleComments(id)),
        );

        if self.dashboard.is_comment_box_open(id) {
            for comment in concern.comments() {
                let comment_id = comment.id;
                card = card.push(
                    row![
                        text(format!("[{}] {}", comment.author_role, comment.text)).size(13),
                        button(text("Delete").size(12)).on_press_maybe(
                            (can_moderate && !pending).then_some(Message::DeleteCommentRequested(id, comment_id)),
                        ),
                    ]
                    .spacing(8)
                    .align_y(Alignment::Center),
                );
            }
            if can_moderate {
                card = card.push(
                    row![
                        text_input("Write a comment", self.dashboard.draft(id))
                            .on_input(move |value| Message::CommentEdited(id, value))
                            .on_submit(Message::CommentSubmitted(id)),
                        button("Add").on_press_maybe((!pending).then_some(Message::CommentSubmitted(id))),
                    ]
                    .spacing(8),
                );
            }
        }

        container(card)
            .padding(12)
            .width(Length::Fixed(320.0))
            .style(container::rounded_box)
            .into()
    }

    fn popup_view(&self) -> Option<Element<Message>> {
        let panel: Column<Message> = match self.dashboard.popup() {
            Popup::Closed => return None,
            Popup::Upload(form) => {
                let pending = self.dashboard.is_upload_pending();
                column![
                    text("Report a concern").size(24),
                    text_input("Title", &form.title).on_input(Message::UploadTitleChanged),
                    text_input("Description", &form.description).on_input(Message::UploadDescriptionChanged),
                    pick_list(
                        self.dashboard.locations(),
                        Some(form.location.clone()).filter(|location| !location.is_empty()),
                        Message::UploadLocationSelected,
                    )
                    .placeholder("Location"),
                    row![
                        text_input("Image reference (optional)", &form.image_url)
                            .on_input(Message::UploadImageChanged),
                        button("Browse...").on_press(Message::PickImage),
                    ]
                    .spacing(8),
                    row![
                        button("Submit").on_press_maybe((!pending).then_some(Message::UploadSubmitted)),
                        button("Cancel").on_press(Message::ClosePopup),
                    ]
                    .spacing(8),
                ]
            }
            Popup::Role(form) => {
                let pending = self.dashboard.is_role_change_pending();
                column![
                    text("Change a user's role").size(24),
                    text_input("Email", &form.email)
                        .on_input(Message::RoleEmailChanged)
                        .on_submit(Message::RoleSubmitted),
                    pick_list(Role::ALL, Some(form.role), Message::RoleSelected),
                    row![
                        button("Apply").on_press_maybe((!pending).then_some(Message::RoleSubmitted)),
                        button("Cancel").on_press(Message::ClosePopup),
                    ]
                    .spacing(8),
                ]
            }
        };

        Some(
            container(panel.spacing(12).max_width(480.0))
                .padding(20)
                .style(container::rounded_box)
                .into(),
        )
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn main() -> iced::Result {
    init_tracing();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "failed to load configuration");
            std::process::exit(2);
        }
    };

    let api: Arc<dyn ConcernApi> = match HttpConcernApi::new(&config.api, &config.session) {
        Ok(api) => Arc::new(api),
        Err(error) => {
            error!(%error, "failed to set up the backend client");
            std::process::exit(2);
        }
    };
    info!(base_url = %config.api.base_url, page_size = config.page_size, "connecting to concern backend");

    iced::application("Concern Desk", ConcernDesk::update, ConcernDesk::view)
        .theme(ConcernDesk::theme)
        .centered()
        .run_with(move || ConcernDesk::new(config, api))
}
