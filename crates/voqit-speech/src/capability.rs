//! Platform capability detection result.

/// Whether a platform speech engine exists.
///
/// Decided once at startup. `Unavailable` is a silent degradation: the
/// corresponding control is simply not offered, it is never an error.
#[derive(Debug)]
pub enum Capability<T> {
    Available(T),
    Unavailable,
}

impl<T> Capability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Unavailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability() {
        let available = Capability::Available(1u8);
        assert!(available.is_available());
        assert_eq!(available.as_ref(), Some(&1));

        let missing: Capability<u8> = Capability::Unavailable;
        assert!(!missing.is_available());
        assert!(missing.as_ref().is_none());
    }
}
