use std::any::Any;
use std::fmt;

/// Failure reported by a consumer callback during frame dispatch.
///
/// Never propagated out of the scheduler: it is logged with the consumer id and
/// the consumer stays registered.
#[derive(Debug)]
pub enum CallbackError {
    /// The callback returned `Err`.
    Failed(anyhow::Error),
    /// The callback panicked; carries the panic message when one was available.
    Panicked(String),
}

impl CallbackError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Ok(s) = payload.downcast::<String>() {
            *s
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "callback failed: {err:#}"),
            Self::Panicked(msg) => write!(f, "callback panicked: {msg}"),
        }
    }
}

impl std::error::Error for CallbackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failed(err) => Some(&**err),
            Self::Panicked(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payload_str() {
        let err = CallbackError::from_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "callback panicked: boom");
    }

    #[test]
    fn panic_payload_string() {
        let err = CallbackError::from_panic(Box::new(String::from("bad state")));
        assert_eq!(err.to_string(), "callback panicked: bad state");
    }

    #[test]
    fn panic_payload_other() {
        let err = CallbackError::from_panic(Box::new(42_u32));
        assert!(matches!(err, CallbackError::Panicked(ref m) if m == "non-string panic payload"));
    }

    #[test]
    fn failed_keeps_context_chain() {
        let inner = anyhow::anyhow!("disk on fire").context("drawing particles");
        let err = CallbackError::Failed(inner);
        assert_eq!(err.to_string(), "callback failed: drawing particles: disk on fire");
    }
}
