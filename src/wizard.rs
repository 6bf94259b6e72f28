//! # Capsule Draft Wizard
//!
//! In-memory, five-step draft of a new capsule. Steps only change on explicit
//! navigation; nothing is persisted until the single creation request made
//! from the review step.
//!
//! ```text
//! Details(1) ⇄ Content(2) ⇄ Recipient(3) ⇄ Schedule(4) ⇄ Review(5)
//!                                                           │ edit(field)
//!        ◄──────────────── jump to the owning step ─────────┘
//! ```
//!
//! `Next` is permissive: no step gates on its fields being filled in.

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::constants::{
    FIELD_MEDIA_FILES, MEDIA_ACCEPT_FILTER, MSG_CAPSULE_CREATED, MSG_CAPSULE_CREATE_FAILED,
    ROUTE_DASHBOARD,
};
use crate::context::AppContext;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::multipart::{FileRef, MultipartForm, Preview};
use crate::router::NavigateOptions;
use crate::scheduler::{DelayedAction, Liveness};
use crate::validation::FormValidation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Details = 1,
    Content = 2,
    Recipient = 3,
    Schedule = 4,
    Review = 5,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Details,
        WizardStep::Content,
        WizardStep::Recipient,
        WizardStep::Schedule,
        WizardStep::Review,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// Following step; the review step is the last.
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(WizardStep::Review)
    }

    pub fn previous(self) -> Self {
        Self::from_number(self.number() - 1).unwrap_or(WizardStep::Details)
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Details => "Capsule Details",
            WizardStep::Content => "Add Content",
            WizardStep::Recipient => "Choose Recipients",
            WizardStep::Schedule => "Set Delivery Schedule",
            WizardStep::Review => "Review & Confirm",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.title())
    }
}

/// A field shown on the review screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewField {
    Title,
    Description,
    MediaFiles,
    Message,
    RecipientEmail,
    DeliveryDate,
    DeliveryTime,
}

impl ReviewField {
    pub const ALL: [ReviewField; 7] = [
        ReviewField::Title,
        ReviewField::Description,
        ReviewField::MediaFiles,
        ReviewField::Message,
        ReviewField::RecipientEmail,
        ReviewField::DeliveryDate,
        ReviewField::DeliveryTime,
    ];

    /// Step on which the field is edited.
    pub fn owning_step(self) -> WizardStep {
        match self {
            ReviewField::Title | ReviewField::Description => WizardStep::Details,
            ReviewField::MediaFiles | ReviewField::Message => WizardStep::Content,
            ReviewField::RecipientEmail => WizardStep::Recipient,
            ReviewField::DeliveryDate | ReviewField::DeliveryTime => WizardStep::Schedule,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewField::Title => "Title",
            ReviewField::Description => "Description",
            ReviewField::MediaFiles => "Media Files",
            ReviewField::Message => "Message",
            ReviewField::RecipientEmail => "Recipient Email",
            ReviewField::DeliveryDate => "Delivery Date",
            ReviewField::DeliveryTime => "Delivery Time",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReviewEntry {
    pub field: ReviewField,
    pub label: &'static str,
    pub value: String,
}

/// Ordered list of files picked for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaAttachments {
    files: Vec<FileRef>,
    multiple: bool,
}

impl MediaAttachments {
    pub fn new(multiple: bool) -> Self {
        Self {
            files: Vec::new(),
            multiple,
        }
    }

    /// Appends in multi-select mode; otherwise the first picked file replaces the list.
    pub fn add(&mut self, picked: impl IntoIterator<Item = FileRef>) {
        if self.multiple {
            self.files.extend(picked);
        } else if let Some(first) = picked.into_iter().next() {
            self.files = vec![first];
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<FileRef> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn previews(&self) -> Vec<Preview> {
        self.files.iter().map(FileRef::preview).collect()
    }

    /// Advisory `accept` filter for the picker. Never enforced.
    pub fn accept_filter(&self) -> &'static str {
        MEDIA_ACCEPT_FILTER
    }

    /// Files the picker filter would not have offered; they are still uploaded.
    pub fn outside_accept_filter(&self) -> Vec<&FileRef> {
        self.files
            .iter()
            .filter(|file| !FormValidation::matches_accept_filter(file.name(), file.mime_type()))
            .collect()
    }
}

impl Default for MediaAttachments {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub media: MediaAttachments,
    pub content_message: String,
    pub recipient_email: String,
    pub delivery_date: String,
    pub delivery_time: String,
}

impl Draft {
    /// Creation payload: scalar fields first, then one part per file in order.
    pub fn to_form(&self) -> MultipartForm {
        let form = MultipartForm::new()
            .text("title", self.title.as_str())
            .text("description", self.description.as_str())
            .text("text_content", self.content_message.as_str())
            .text("recipient_email", self.recipient_email.as_str())
            .text("delivery_date", self.delivery_date.as_str())
            .text("delivery_time", self.delivery_time.as_str());

        self.media
            .files()
            .iter()
            .cloned()
            .fold(form, |form, file| form.file(FIELD_MEDIA_FILES, file))
    }

    pub fn review(&self) -> Vec<ReviewEntry> {
        ReviewField::ALL
            .into_iter()
            .map(|field| ReviewEntry {
                field,
                label: field.label(),
                value: self.review_value(field),
            })
            .collect()
    }

    fn review_value(&self, field: ReviewField) -> String {
        let text = match field {
            ReviewField::Title => &self.title,
            ReviewField::Description => &self.description,
            ReviewField::Message => &self.content_message,
            ReviewField::RecipientEmail => &self.recipient_email,
            ReviewField::DeliveryDate => &self.delivery_date,
            ReviewField::DeliveryTime => &self.delivery_time,
            ReviewField::MediaFiles => {
                return if self.media.is_empty() {
                    "No files selected".to_string()
                } else {
                    self.media
                        .files()
                        .iter()
                        .map(FileRef::name)
                        .collect::<Vec<_>>()
                        .join(", ")
                };
            }
        };

        if text.is_empty() {
            "Not provided".to_string()
        } else {
            text.clone()
        }
    }
}

/// The mounted wizard: draft, current step and the submission guard.
pub struct CapsuleWizard {
    ctx: AppContext,
    logger: Logger,
    liveness: Liveness,
    step: Cell<WizardStep>,
    draft: RefCell<Draft>,
    submitting: Cell<bool>,
    last_error: RefCell<Option<String>>,
    redirect: RefCell<Option<DelayedAction>>,
}

impl CapsuleWizard {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            logger: Logger::for_component("capsule-wizard"),
            liveness: Liveness::new(),
            step: Cell::new(WizardStep::Details),
            draft: RefCell::new(Draft::default()),
            submitting: Cell::new(false),
            last_error: RefCell::new(None),
            redirect: RefCell::new(None),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step.get()
    }

    pub fn draft(&self) -> Draft {
        self.draft.borrow().clone()
    }

    /// Edits the draft in place.
    pub fn update(&self, edit: impl FnOnce(&mut Draft)) {
        edit(&mut self.draft.borrow_mut());
    }

    pub fn add_media(&self, picked: impl IntoIterator<Item = FileRef>) {
        self.draft.borrow_mut().media.add(picked);
    }

    pub fn remove_media(&self, index: usize) -> Option<FileRef> {
        self.draft.borrow_mut().media.remove(index)
    }

    pub fn review(&self) -> Vec<ReviewEntry> {
        self.draft.borrow().review()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    pub fn next(&self) -> WizardStep {
        let step = self.step.get().next();
        self.step.set(step);
        step
    }

    pub fn back(&self) -> AppResult<WizardStep> {
        self.ensure_idle()?;
        let step = self.step.get().previous();
        self.step.set(step);
        Ok(step)
    }

    /// Jumps from the review screen to the step owning `field`.
    pub fn edit(&self, field: ReviewField) -> AppResult<WizardStep> {
        self.ensure_idle()?;
        if self.step.get() != WizardStep::Review {
            return Err(AppError::InvalidStep(format!(
                "edit is only available from {}",
                WizardStep::Review
            )));
        }
        let step = field.owning_step();
        self.step.set(step);
        Ok(step)
    }

    fn ensure_idle(&self) -> AppResult<()> {
        if self.submitting.get() {
            Err(AppError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }

    /// Sends the draft as one creation request.
    ///
    /// On success a notice is shown and the dashboard is opened after the
    /// redirect delay; the guard stays set because the draft is done. On
    /// failure the draft and step are untouched and the guard is released.
    pub async fn submit(&self) -> AppResult<()> {
        if self.step.get() != WizardStep::Review {
            return Err(AppError::InvalidStep(format!(
                "submit is only available from {}",
                WizardStep::Review
            )));
        }
        if self.submitting.replace(true) {
            return Err(AppError::SubmissionInFlight);
        }
        self.last_error.replace(None);

        let form = self.draft.borrow().to_form();
        self.logger.info(
            "Submitting capsule",
            log_data!("parts" => form.parts().len(), "files" => form.files().count()),
        );

        let result = self.ctx.api.create_capsule(form).await;
        if !self.liveness.is_alive() {
            return result.map(|_| ());
        }

        match result {
            Ok(_) => {
                self.ctx.feedback.success(MSG_CAPSULE_CREATED);
                let navigator = self.ctx.navigator.clone();
                let redirect = self
                    .ctx
                    .scheduler
                    .defer(self.ctx.config.redirect_delay(), move || {
                        navigator.navigate(ROUTE_DASHBOARD, NavigateOptions::default())
                    });
                self.redirect.replace(Some(redirect));
                Ok(())
            }
            Err(e) => {
                let message = e.user_message(MSG_CAPSULE_CREATE_FAILED);
                self.logger.error(
                    "Capsule creation failed",
                    log_data!("error" => e.to_string()),
                );
                self.ctx.feedback.error(message.as_str());
                self.last_error.replace(Some(message));
                self.submitting.set(false);
                Err(e)
            }
        }
    }

    /// Tears the view down; a pending redirect is cancelled.
    pub fn unmount(&self) {
        self.liveness.unmount();
        if let Some(redirect) = self.redirect.take() {
            redirect.cancel();
        }
    }
}
