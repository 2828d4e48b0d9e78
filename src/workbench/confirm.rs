/// Yes/no question put to whoever drives the workbench.
///
/// A GUI would show a dialog; the CLI answers from a flag. Closures taking
/// `(title, message)` work directly.
pub trait Confirm {
    fn confirm(&mut self, title: &str, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str, &str) -> bool,
{
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        self(title, message)
    }
}

/// Gives the same answer to every question, and logs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&mut self, title: &str, _message: &str) -> bool {
        tracing::debug!(title, answer = self.0, "confirmation answered");
        self.0
    }
}
