//! Class-name completion while a node is being edited

/// Supplies candidates for the first token of the edit buffer.
///
/// Implementations must be pure: the same prefix always yields the same list.
pub trait CompletionProvider {
    fn complete(&self, prefix: &str) -> Vec<String>;
}

/// Case-sensitive prefix match over a fixed vocabulary. An empty prefix
/// yields the whole vocabulary.
#[derive(Debug, Clone, Default)]
pub struct VocabularyCompletion {
    vocabulary: Vec<String>,
}

impl VocabularyCompletion {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary.into_iter().map(Into::into).collect(),
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}

impl CompletionProvider for VocabularyCompletion {
    fn complete(&self, prefix: &str) -> Vec<String> {
        self.vocabulary
            .iter()
            .filter(|word| word.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Provider that never suggests anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompletion;

impl CompletionProvider for NoCompletion {
    fn complete(&self, _prefix: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Direction for moving the highlighted candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

/// Candidate list shown under the node being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOverlay {
    candidates: Vec<String>,
    highlighted: Option<usize>,
}

impl CompletionOverlay {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            highlighted: None,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlighted_candidate(&self) -> Option<&str> {
        self.highlighted
            .and_then(|index| self.candidates.get(index))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Move the highlight one step with wraparound. With nothing highlighted,
    /// forward picks the first candidate and backward the last.
    pub fn cycle(&mut self, direction: CycleDirection) {
        let len = self.candidates.len();
        if len == 0 {
            return;
        }
        self.highlighted = Some(match (self.highlighted, direction) {
            (None, CycleDirection::Forward) => 0,
            (None, CycleDirection::Backward) => len - 1,
            (Some(index), CycleDirection::Forward) => (index + 1) % len,
            (Some(index), CycleDirection::Backward) => (index + len - 1) % len,
        });
    }
}
