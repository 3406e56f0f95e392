#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Transient "what the pipeline is doing" state. Never part of the transcript.
pub struct ActivityIndicator {
    loading: bool,
    message: Option<String>,
}

impl ActivityIndicator {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The activity line a UI should show right now, if any.
    pub fn current(&self) -> Option<&str> {
        if self.loading {
            self.message()
        } else {
            None
        }
    }

    pub(crate) fn begin_loading(&mut self) {
        self.loading = true;
    }

    pub(crate) fn report(&mut self, message: String) {
        self.loading = true;
        self.message = Some(message);
    }

    pub(crate) fn clear(&mut self) {
        self.loading = false;
        self.message = None;
    }
}
