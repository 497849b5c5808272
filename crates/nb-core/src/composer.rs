//! # Notice Composer
//!
//! The write form without its widgets: holds the draft, turns it into a
//! payload on submit, and guards the way back to the list.
//!
//! Submit runs `Idle → Submitting → Redirected | Failed`. A failed submit
//! leaves the draft in place so the user can try again.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{NoticeDraft, NoticeNo, NoticePayload, Route, SeparatedContent};
use crate::resize::{resize_and_compress, ResizeOptions};
use crate::separator::separate_content;
use crate::traits::{Dialog, MarkupParser, Navigator, NoticeApi, RasterSurface};

/// Shown when anything between reading the draft and getting a notice number fails.
pub const SAVE_FAILED_MESSAGE: &str = "게시글 저장 중 오류가 발생했습니다.";

/// Asked before leaving the form for the list.
pub const LEAVE_CONFIRM_MESSAGE: &str =
    "입력한 내용이 저장되지 않을 수 있습니다. 정말로 나가시겠습니까?";

/// Collaborators injected into the composer.
#[derive(Clone)]
pub struct ComposerPorts {
    pub api: Arc<dyn NoticeApi>,
    pub markup: Arc<dyn MarkupParser>,
    pub raster: Arc<dyn RasterSurface>,
    pub navigator: Arc<dyn Navigator>,
    pub dialog: Arc<dyn Dialog>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComposerSettings {
    pub resize: ResizeOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    /// Saved; the user was sent to the notice's detail view
    Redirected(NoticeNo),
    /// Not saved; the user was alerted and is still on the form
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Left,
    Stayed,
}

pub struct NoticeComposer {
    ports: ComposerPorts,
    settings: ComposerSettings,
    draft: NoticeDraft,
    state: SubmitState,
}

impl NoticeComposer {
    pub fn new(ports: ComposerPorts, settings: ComposerSettings) -> Self {
        Self {
            ports,
            settings,
            draft: NoticeDraft::default(),
            state: SubmitState::Idle,
        }
    }

    pub fn draft(&self) -> &NoticeDraft {
        &self.draft
    }

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    pub fn set_title(&mut self, title: &str) {
        self.draft.set_title(title);
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.draft.set_content(content);
    }

    /// Saves the draft and navigates to the new notice.
    ///
    /// Every failure ends the same way: logged, one alert, state `Failed`.
    pub async fn submit(&mut self) -> &SubmitState {
        self.state = SubmitState::Submitting;

        match self.save_notice().await {
            Ok(no) => {
                tracing::info!(notice_no = %no, "notice saved");
                self.draft = NoticeDraft::default();
                self.ports.navigator.navigate(Route::NoticeContent(no.clone()));
                self.state = SubmitState::Redirected(no);
            }
            Err(e) => {
                let stage = if e.is_submission_failure() { "request" } else { "image" };
                tracing::error!(error = %e, stage, "Error saving notice");
                self.ports.dialog.alert(SAVE_FAILED_MESSAGE);
                self.state = SubmitState::Failed;
            }
        }

        &self.state
    }

    /// Builds the request body from the current draft.
    ///
    /// The first image is cut out of the content; if it was embedded it is
    /// shrunk and sent as `file`, without its `data:` header.
    pub async fn build_payload(&self) -> Result<NoticePayload> {
        let SeparatedContent { text, image_data } =
            separate_content(self.ports.markup.as_ref(), &self.draft.content);

        let file = match image_data {
            Some(uri) => {
                let raster = self.ports.raster.as_ref();
                let processed = resize_and_compress(raster, &uri, self.settings.resize).await?;
                Some(processed.payload().to_string())
            }
            None => None,
        };

        Ok(NoticePayload {
            title: self.draft.title.clone(),
            content: text,
            file,
        })
    }

    /// Back to the list, after the user confirms losing the draft.
    pub fn request_exit(&mut self) -> ExitDecision {
        if !self.ports.dialog.confirm(LEAVE_CONFIRM_MESSAGE) {
            return ExitDecision::Stayed;
        }
        self.draft = NoticeDraft::default();
        self.ports.navigator.navigate(Route::NoticeList);
        ExitDecision::Left
    }

    async fn save_notice(&self) -> Result<NoticeNo> {
        let payload = self.build_payload().await?;
        tracing::debug!(
            title_chars = payload.title.chars().count(),
            has_file = payload.file.is_some(),
            "posting notice"
        );
        self.ports.api.insert_notice(&payload).await
    }
}
