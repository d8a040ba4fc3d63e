use core::fmt;

/// Parameters of a single connection attempt.
///
/// Nothing is validated here: the host may be empty and the port may not even be a number.
/// Validation is the engine's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub host: String,
    pub port: String,
    pub credentials: Option<Credentials>,
}

impl ConnectionRequest {
    pub fn new(host: impl Into<String>, port: impl ToString) -> Self {
        Self {
            host: host.into(),
            port: port.to_string(),
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn without_credentials(mut self) -> Self {
        self.credentials = None;
        self
    }

    /// Builds a request from the raw text of a connect form.
    ///
    /// An empty username means no credentials are supplied; the password is then ignored.
    pub fn from_form(fields: FormFields) -> Self {
        let FormFields {
            host,
            port,
            username,
            password,
        } = fields;

        let credentials = if username.is_empty() {
            None
        } else {
            Some(Credentials { username, password })
        };

        Self {
            host,
            port,
            credentials,
        }
    }
}

/// Raw user-supplied text, exactly as typed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for FormFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFields")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
