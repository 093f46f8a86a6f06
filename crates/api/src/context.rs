use stockmaster_core::ActingPrincipal;

/// Principal context for a request.
///
/// Inserted by [`crate::middleware::principal_middleware`]; present for all
/// routes except `/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: ActingPrincipal,
}

impl PrincipalContext {
    pub fn new(principal: ActingPrincipal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &ActingPrincipal {
        &self.principal
    }
}
