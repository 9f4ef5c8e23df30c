use crate::errors::AppError;

/// Injected "is the caller an administrator" capability. The engine never
/// sees how credentials are issued; it only asks this predicate before
/// touching operator-only state.
pub trait AdminGate: Send + Sync {
    fn is_admin(&self, credential: Option<&str>) -> bool;
}

/// Default gate: compares the bearer credential against a configured token.
pub struct TokenGate {
    token: String,
}

impl TokenGate {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

impl AdminGate for TokenGate {
    fn is_admin(&self, credential: Option<&str>) -> bool {
        match credential {
            Some(c) => !self.token.is_empty() && c == self.token,
            None => false,
        }
    }
}

pub fn require_admin(gate: &dyn AdminGate, credential: Option<&str>) -> Result<(), AppError> {
    if gate.is_admin(credential) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}
