use async_trait::async_trait;
use parking_lot::Mutex;

use remora::handlers::{Translation, Translator};

/// Scriptable [`Translator`] fake.
///
/// Succeeds by default, suffixing the target language onto the text;
/// [`fail_with`](Self::fail_with) switches every subsequent call to the
/// given error. All translated texts are recorded for assertions.
#[derive(Default)]
pub struct FakeTranslator {
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent call with this message.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    /// Go back to succeeding.
    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Texts passed to `translate` so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> anyhow::Result<Translation> {
        self.calls.lock().push(text.to_string());
        if let Some(message) = self.failure.lock().clone() {
            anyhow::bail!("{message}");
        }
        Ok(Translation {
            text: format!("{text} ({target_language})"),
            detected_language: "en".to_string(),
        })
    }
}
