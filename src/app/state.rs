use crate::error::{Result, SplitterError};
use crate::processing::{ImageSource, ProcessingParameters, ProcessingResult};
use derivative::Derivative;
use std::sync::mpsc::Receiver;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStatus {
    #[default]
    Idle,
    AwaitingInput,
    Submitting,
    Ready,
    Failed,
}

#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct WorkflowState {
    pub status: WorkflowStatus,
    pub image: Option<ImageSource>,
    pub params: ProcessingParameters,
    pub result: Option<ProcessingResult>,
    pub error_message: Option<String>,
    pub notice: Option<String>,
    pub dragging: bool,
    generation: u64,
    #[derivative(Debug = "ignore")]
    pub outcome_receiver: Option<Receiver<Result<ProcessingResult>>>,
    #[derivative(Debug = "ignore")]
    pub image_receiver: Option<Receiver<Result<ImageSource>>>,
}

impl WorkflowState {
    /// Back to no image and no results. Parameters survive, and so does the
    /// generation counter so preview caches never see a number twice.
    pub fn clear(&mut self) {
        *self = WorkflowState {
            params: self.params,
            generation: self.generation,
            ..WorkflowState::default()
        };
    }

    pub fn is_submitting(&self) -> bool {
        self.status == WorkflowStatus::Submitting
    }

    pub fn can_submit(&self) -> bool {
        self.image.is_some() && !self.is_submitting()
    }

    pub fn select_image(&mut self, image: ImageSource) {
        info!("Selected image {:?}", image);
        self.image = Some(image);
        self.error_message = None;
        // An in-flight request keeps the image it was sent with.
        if !self.is_submitting() {
            self.status = WorkflowStatus::AwaitingInput;
        }
    }

    /// Moves to `Submitting` and returns what should be sent. Nothing changes
    /// when the submission is rejected, apart from the notice.
    pub fn begin_submit(&mut self) -> Result<(ImageSource, ProcessingParameters)> {
        if self.is_submitting() {
            warn!("Rejected submission: request already in flight");
            return Err(SplitterError::AlreadySubmitting);
        }

        let Some(image) = self.image.clone() else {
            warn!("Rejected submission: no image selected");
            let err = SplitterError::MissingInput;
            self.error_message = Some(err.user_message());
            return Err(err);
        };

        self.status = WorkflowStatus::Submitting;
        self.error_message = None;
        self.notice = None;
        Ok((image, self.params))
    }

    /// Applies the outcome of the in-flight run. A success replaces the
    /// previous result as a whole; a failure leaves it on screen.
    pub fn finish(&mut self, outcome: Result<ProcessingResult>) {
        if !self.is_submitting() {
            warn!("Ignoring outcome that arrived outside of a submission");
            return;
        }

        match outcome {
            Ok(mut result) => {
                self.generation += 1;
                result.generation = self.generation;
                info!(
                    "Run {} ready with {} tiles",
                    result.generation,
                    result.len()
                );
                self.result = Some(result);
                self.status = WorkflowStatus::Ready;
            }
            Err(e) => {
                error!("Processing failed: {}", e);
                self.error_message = Some(e.user_message());
                self.status = WorkflowStatus::Failed;
            }
        }
    }

    pub fn get_status_text(&self) -> String {
        match self.status {
            WorkflowStatus::Idle => "Click to upload image or drag and drop the file".to_string(),
            WorkflowStatus::AwaitingInput => "Image uploaded!".to_string(),
            WorkflowStatus::Submitting => "Processing image...".to_string(),
            WorkflowStatus::Ready => match &self.result {
                Some(result) => format!("{} images ready", result.len()),
                None => String::new(),
            },
            WorkflowStatus::Failed => "Processing failed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::archive_fixtures::grid_archive;
    use crate::processing::unpack;
    use std::sync::Arc;

    fn image(name: &str) -> ImageSource {
        ImageSource::from_bytes(name, Arc::from(&b"raw"[..]))
    }

    fn result(count: usize) -> ProcessingResult {
        unpack(grid_archive(count).into(), 3).unwrap()
    }

    #[test]
    fn starts_idle_and_cannot_submit() {
        let state = WorkflowState::default();
        assert_eq!(state.status, WorkflowStatus::Idle);
        assert!(!state.can_submit());
    }

    #[test]
    fn submitting_without_image_is_rejected() {
        let mut state = WorkflowState::default();
        let err = state.begin_submit().unwrap_err();

        assert!(matches!(err, SplitterError::MissingInput));
        assert_eq!(state.status, WorkflowStatus::Idle);
        assert_eq!(
            state.error_message.as_deref(),
            Some("Please upload an image first.")
        );
    }

    #[test]
    fn full_cycle_reaches_ready() {
        let mut state = WorkflowState::default();
        state.select_image(image("a.png"));
        assert_eq!(state.status, WorkflowStatus::AwaitingInput);
        assert!(state.can_submit());

        let (sent, params) = state.begin_submit().unwrap();
        assert_eq!(sent.name, "a.png");
        assert_eq!(params, ProcessingParameters::default());
        assert_eq!(state.status, WorkflowStatus::Submitting);
        assert!(!state.can_submit());

        state.finish(Ok(result(9)));
        assert_eq!(state.status, WorkflowStatus::Ready);
        assert_eq!(state.result.as_ref().unwrap().len(), 9);
        assert_eq!(state.result.as_ref().unwrap().generation(), 1);
        assert!(state.can_submit());
    }

    #[test]
    fn second_submission_while_in_flight_is_rejected() {
        let mut state = WorkflowState::default();
        state.select_image(image("a.png"));
        state.begin_submit().unwrap();

        let err = state.begin_submit().unwrap_err();
        assert!(matches!(err, SplitterError::AlreadySubmitting));
        assert_eq!(state.status, WorkflowStatus::Submitting);
    }

    #[test]
    fn new_result_replaces_previous_one() {
        let mut state = WorkflowState::default();
        state.select_image(image("a.png"));
        state.begin_submit().unwrap();
        state.finish(Ok(result(9)));

        state.begin_submit().unwrap();
        state.finish(Ok(result(2)));

        let current = state.result.as_ref().unwrap();
        assert_eq!(current.len(), 2);
        assert_eq!(current.generation(), 2);
        assert!(current.get("tile_8.png").is_none());
    }

    #[test]
    fn failure_keeps_previous_result() {
        let mut state = WorkflowState::default();
        state.select_image(image("a.png"));
        state.begin_submit().unwrap();
        state.finish(Ok(result(4)));

        state.begin_submit().unwrap();
        state.finish(Err(SplitterError::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )));

        assert_eq!(state.status, WorkflowStatus::Failed);
        assert!(state.can_submit());
        assert_eq!(state.result.as_ref().unwrap().len(), 4);
        assert_eq!(
            state.error_message.as_deref(),
            Some("Processing failed, please try again.")
        );
    }

    #[test]
    fn failure_without_prior_result_creates_none() {
        let mut state = WorkflowState::default();
        state.select_image(image("a.png"));
        state.begin_submit().unwrap();
        state.finish(Err(SplitterError::EmptyArchive));

        assert_eq!(state.status, WorkflowStatus::Failed);
        assert!(state.result.is_none());
    }

    #[test]
    fn selecting_while_submitting_keeps_status() {
        let mut state = WorkflowState::default();
        state.select_image(image("a.png"));
        state.begin_submit().unwrap();

        state.select_image(image("b.png"));
        assert_eq!(state.status, WorkflowStatus::Submitting);
        assert_eq!(state.image.as_ref().unwrap().name, "b.png");
    }

    #[test]
    fn selecting_after_ready_awaits_input_and_keeps_tiles() {
        let mut state = WorkflowState::default();
        state.select_image(image("a.png"));
        state.begin_submit().unwrap();
        state.finish(Ok(result(3)));

        state.select_image(image("b.png"));
        assert_eq!(state.status, WorkflowStatus::AwaitingInput);
        assert_eq!(state.result.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn stray_outcome_is_ignored() {
        let mut state = WorkflowState::default();
        state.finish(Ok(result(3)));
        assert_eq!(state.status, WorkflowStatus::Idle);
        assert!(state.result.is_none());
    }

    #[test]
    fn clear_keeps_parameters() {
        let mut state = WorkflowState::default();
        state.params.set_rows(4);
        state.select_image(image("a.png"));
        state.begin_submit().unwrap();
        state.finish(Ok(result(3)));

        state.clear();
        assert_eq!(state.status, WorkflowStatus::Idle);
        assert!(state.image.is_none());
        assert!(state.result.is_none());
        assert_eq!(state.params.rows(), 4);

        state.select_image(image("b.png"));
        state.begin_submit().unwrap();
        state.finish(Ok(result(2)));
        assert_eq!(state.result.as_ref().unwrap().generation(), 2);
    }
}
