use crate::pipeline::BUSY_STATUS;

/// Text field, submit control and status label of the composer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageInput {
    value: String,
    is_busy: bool,
}

impl MessageInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the field content. Ignored while the control is disabled.
    pub fn set_value(&mut self, value: impl Into<String>) -> bool {
        if self.is_busy {
            return false;
        }
        self.value = value.into();
        true
    }

    /// Voice results overwrite the field even while a send is in flight.
    pub(crate) fn overwrite(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Takes the trimmed content for submission, leaving the field empty.
    pub(crate) fn take_trimmed(&mut self) -> String {
        let content = self.value.trim().to_string();
        self.value.clear();
        content
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.is_busy = busy;
    }

    /// Both the text field and the submit control follow this flag.
    pub fn is_enabled(&self) -> bool {
        !self.is_busy
    }

    pub fn status(&self) -> Option<&'static str> {
        self.is_busy.then_some(BUSY_STATUS)
    }
}
