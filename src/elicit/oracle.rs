//! The oracle: whoever answers "which of these two do you prefer?".

use crate::relation::Relation;
use crate::space::Level;

/// Returned by an oracle to abandon the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Abort;

/// Answers pairwise preference questions.
///
/// `Greater` means `a` is preferred, `Less` means `b` is preferred and
/// `Equal` means indifference. `Incomparable` is not a valid answer.
#[async_trait::async_trait]
pub trait Oracle<L: Level>: Send {
    async fn ask(&mut self, a: &[L], b: &[L]) -> Result<Relation, Abort>;
}

/// Adapts a synchronous closure into an [`Oracle`].
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<L, F> Oracle<L> for FnOracle<F>
where
    L: Level,
    F: FnMut(&[L], &[L]) -> Result<Relation, Abort> + Send,
{
    async fn ask(&mut self, a: &[L], b: &[L]) -> Result<Relation, Abort> {
        (self.f)(a, b)
    }
}
