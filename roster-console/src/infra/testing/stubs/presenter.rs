use parking_lot::Mutex;
use std::sync::Arc;

use crate::render::{Frame, Presenter, UserListView};

/// Presenter that keeps every frame it is handed.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }

    pub fn last_user_list(&self) -> Option<UserListView> {
        self.frames.lock().iter().rev().find_map(|frame| match frame {
            Frame::UserList(view) => Some(view.clone()),
            _ => None,
        })
    }

    pub fn contains(&self, predicate: impl Fn(&Frame) -> bool) -> bool {
        self.frames.lock().iter().any(predicate)
    }
}

impl Presenter for RecordingPresenter {
    fn present(&self, frame: &Frame) {
        self.frames.lock().push(frame.clone());
    }
}
