//! Nullable notifier: collects notices for assertions.

use std::sync::Mutex;

use crowd_types::{Notice, Notifier};

#[derive(Default)]
pub struct NullNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.title).collect()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl Notifier for NullNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
