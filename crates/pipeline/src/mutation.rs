/// A structural mutation observed on the host document
///
/// Carries the markup of the subtrees the mutation added; removals and
/// attribute churn are of no interest to the pipeline.
#[derive(Debug, Clone)]
pub struct MutationEvent {
  pub added: Vec<String>,
}

impl MutationEvent {
  pub fn new(added: Vec<String>) -> Self {
    Self { added }
  }

  pub fn single(subtree_html: impl Into<String>) -> Self {
    Self {
      added: vec![subtree_html.into()],
    }
  }

  pub fn is_empty(&self) -> bool {
    self.added.iter().all(|s| s.trim().is_empty())
  }
}
