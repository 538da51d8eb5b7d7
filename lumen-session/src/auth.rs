use serde::Serialize;

/// What the last server response said about the acting identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    #[default]
    Unknown,
    Authenticated,
    Anonymous,
}

/// Tracks whether the session is acting anonymously and blocks bookmark
/// mutations until a read comes back authenticated again.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    identity: Identity,
    auth_error: bool,
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the `authenticated` flag of a successful read.
    pub fn observe_read(&mut self, authenticated: bool) {
        if authenticated {
            self.identity = Identity::Authenticated;
            self.auth_error = false;
        } else {
            self.identity = Identity::Anonymous;
            self.auth_error = true;
        }
    }

    /// A mutation or a read was refused as unauthenticated.
    pub fn observe_rejection(&mut self) {
        self.identity = Identity::Anonymous;
        self.auth_error = true;
    }

    /// Mutations are attempted unless the server already told us we are anonymous.
    pub fn allows_mutation(&self) -> bool {
        self.identity != Identity::Anonymous
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn auth_error(&self) -> bool {
        self.auth_error
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
