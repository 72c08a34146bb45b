use crate::{ProposalRequest, ProposerError};

/// Produces raw candidate questions for a prompt via deterministic beam search.
pub trait QuestionProposer {
    fn propose(&self, request: &ProposalRequest) -> Result<Vec<String>, ProposerError>;
}

impl<T: QuestionProposer + ?Sized> QuestionProposer for &T {
    fn propose(&self, request: &ProposalRequest) -> Result<Vec<String>, ProposerError> {
        (**self).propose(request)
    }
}

impl<T: QuestionProposer + ?Sized> QuestionProposer for Box<T> {
    fn propose(&self, request: &ProposalRequest) -> Result<Vec<String>, ProposerError> {
        (**self).propose(request)
    }
}
