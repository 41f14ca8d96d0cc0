use crate::config::AuthConfig;

/// A type whose instances (and the type itself) live under one or more guards.
///
/// Resolution order for an instance: its own [`guard_name`](Self::guard_name),
/// then the type-level [`DEFAULT_GUARD`](Self::DEFAULT_GUARD), then every
/// configured guard whose provider authenticates [`MODEL_TYPE`](Self::MODEL_TYPE).
pub trait GuardScoped {
    /// Model type matched against `auth.providers.*.model`.
    const MODEL_TYPE: &'static str;

    /// Guard shared by every instance of the type, if any.
    const DEFAULT_GUARD: Option<&'static str> = None;

    /// Guard attribute carried by this instance, if any.
    fn guard_name(&self) -> Option<&str> {
        None
    }
}

/// Maps subjects and subject types to guard names using the auth config.
#[derive(Debug, Clone)]
pub struct GuardResolver {
    auth: AuthConfig,
}

impl GuardResolver {
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth }
    }

    /// Guard names for a subject instance, in resolution order.
    pub fn names_for<T: GuardScoped + ?Sized>(&self, subject: &T) -> Vec<String> {
        self.resolve(subject.guard_name(), T::DEFAULT_GUARD, T::MODEL_TYPE)
    }

    /// Guard names for a subject type.
    pub fn names_for_type<T: GuardScoped + ?Sized>(&self) -> Vec<String> {
        self.resolve(None, T::DEFAULT_GUARD, T::MODEL_TYPE)
    }

    /// Configured guards whose provider model is `model_type`, in declaration order.
    pub fn names_for_model(&self, model_type: &str) -> Vec<String> {
        self.auth
            .guards
            .iter()
            .filter(|(_, guard)| {
                guard
                    .provider
                    .as_deref()
                    .and_then(|provider| self.auth.providers.get(provider))
                    .and_then(|provider| provider.model.as_deref())
                    == Some(model_type)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// First resolved guard for `subject`, or the global default guard.
    pub fn default_name_for<T: GuardScoped + ?Sized>(&self, subject: &T) -> String {
        self.first_or_default(self.names_for(subject))
    }

    /// First resolved guard for the type, or the global default guard.
    pub fn default_name_for_type<T: GuardScoped + ?Sized>(&self) -> String {
        self.first_or_default(self.names_for_type::<T>())
    }

    /// The global default guard.
    pub fn default_guard(&self) -> &str {
        &self.auth.defaults.guard
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    fn resolve(
        &self,
        instance_guard: Option<&str>,
        type_guard: Option<&str>,
        model_type: &str,
    ) -> Vec<String> {
        // Empty guard attributes count as absent.
        if let Some(guard) = instance_guard.filter(|g| !g.is_empty()) {
            return vec![guard.to_string()];
        }
        if let Some(guard) = type_guard.filter(|g| !g.is_empty()) {
            return vec![guard.to_string()];
        }
        self.names_for_model(model_type)
    }

    fn first_or_default(&self, names: Vec<String>) -> String {
        names
            .into_iter()
            .next()
            .unwrap_or_else(|| self.auth.defaults.guard.clone())
    }
}
