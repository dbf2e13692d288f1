/// Errors produced by the `clouding-core` crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A resource ID was empty or contained characters outside `[A-Za-z0-9_-]`.
    #[error("invalid resource id '{value}'")]
    InvalidResourceId { value: String },

    /// A deployment type was neither `plan` nor `deploy`.
    #[error("invalid deployment type '{value}': expected 'plan' or 'deploy'")]
    InvalidDeploymentType { value: String },

    /// An identity claim required to build an authenticated user was unusable.
    #[error("invalid identity claim '{claim}': {reason}")]
    InvalidClaim { claim: &'static str, reason: String },
}
