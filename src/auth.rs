//! Authorization for the admin write routes.

/// Decides whether a caller-supplied credential may perform an admin action.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, supplied: Option<&str>) -> bool;
}

/// A single server-held secret compared by plain string equality.
///
/// With no secret configured every request is refused, and an empty
/// supplied value never matches.
#[derive(Debug, Clone, Default)]
pub struct SharedSecret {
    secret: Option<String>,
}

impl SharedSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }
}

impl Authorizer for SharedSecret {
    fn authorize(&self, supplied: Option<&str>) -> bool {
        match (self.secret.as_deref(), supplied) {
            (Some(expected), Some(given)) => !given.is_empty() && given == expected,
            _ => false,
        }
    }
}
