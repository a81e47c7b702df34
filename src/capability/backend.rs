use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;

use crate::error::{Error, Result};

/// A set of interchangeable implementations of a scheme's primitive.
pub trait Backend: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every backend, highest priority first.
    const ALL: &'static [Self];

    /// Name used to select the backend.
    fn name(self) -> &'static str;

    /// Whether the backend can run in this build.
    fn is_available(self) -> bool;
}

const UNSET: usize = 0;

/// Process-wide record of which backend a scheme uses.
///
/// The slot holds an index into `B::ALL`, so a reader always sees either the old or the new
/// selection.
pub struct BackendSlot<B: Backend> {
    scheme: &'static str,
    selected: AtomicUsize,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend> BackendSlot<B> {
    /// An empty slot. The default backend is picked on first use.
    pub const fn new(scheme: &'static str) -> Self {
        BackendSlot {
            scheme,
            selected: AtomicUsize::new(UNSET),
            _backend: PhantomData,
        }
    }

    /// Names of all backends in priority order, available or not.
    pub fn list_backends(&self) -> Vec<&'static str> {
        B::ALL.iter().map(|b| b.name()).collect()
    }

    /// Whether `name` is a known backend usable in this build.
    pub fn backend_available(&self, name: &str) -> bool {
        B::ALL
            .iter()
            .any(|b| b.name() == name && b.is_available())
    }

    /// Makes `name` the active backend. `None` or `"default"` picks the first available one.
    pub fn select_backend(&self, name: Option<&str>) -> Result<B> {
        let found = match name {
            None | Some("default") => B::ALL
                .iter()
                .position(|b| b.is_available())
                .ok_or(Error::NoBackendAvailable {
                    scheme: self.scheme,
                })?,
            Some(name) => B::ALL
                .iter()
                .position(|b| b.name() == name && b.is_available())
                .ok_or_else(|| Error::InvalidBackend {
                    scheme: self.scheme,
                    backend: name.to_owned(),
                })?,
        };
        let backend = B::ALL[found];
        debug!("{}: using {} backend", self.scheme, backend.name());
        self.selected.store(found + 1, Ordering::Release);
        Ok(backend)
    }

    /// The active backend, selecting the default if none was chosen yet.
    pub fn get_backend(&self) -> Result<B> {
        match self.selected.load(Ordering::Acquire) {
            UNSET => self.select_backend(None),
            index => Ok(B::ALL[index - 1]),
        }
    }
}

impl<B: Backend> fmt::Debug for BackendSlot<B> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let current = match self.selected.load(Ordering::Acquire) {
            UNSET => None,
            index => Some(B::ALL[index - 1]),
        };
        fmt.debug_struct("BackendSlot")
            .field("scheme", &self.scheme)
            .field("selected", &current)
            .finish()
    }
}

/// Backend management for a scheme with several implementations.
pub trait HasManyBackends {
    /// The scheme's backend set.
    type Backend: Backend;

    /// The scheme's process-wide slot.
    fn backend_slot() -> &'static BackendSlot<Self::Backend>;

    /// See [`BackendSlot::list_backends`].
    fn list_backends() -> Vec<&'static str> {
        Self::backend_slot().list_backends()
    }

    /// See [`BackendSlot::backend_available`].
    fn backend_available(name: &str) -> bool {
        Self::backend_slot().backend_available(name)
    }

    /// See [`BackendSlot::select_backend`].
    fn select_backend(name: Option<&str>) -> Result<Self::Backend> {
        Self::backend_slot().select_backend(name)
    }

    /// See [`BackendSlot::get_backend`].
    fn get_backend() -> Result<Self::Backend> {
        Self::backend_slot().get_backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Toy {
        Missing,
        Fast,
        Slow,
    }

    impl Backend for Toy {
        const ALL: &'static [Toy] = &[Toy::Missing, Toy::Fast, Toy::Slow];

        fn name(self) -> &'static str {
            match self {
                Toy::Missing => "missing",
                Toy::Fast => "fast",
                Toy::Slow => "slow",
            }
        }

        fn is_available(self) -> bool {
            self != Toy::Missing
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Nothing;

    impl Backend for Nothing {
        const ALL: &'static [Nothing] = &[Nothing];

        fn name(self) -> &'static str {
            "nothing"
        }

        fn is_available(self) -> bool {
            false
        }
    }

    #[test]
    fn default_is_first_available() {
        let slot = BackendSlot::<Toy>::new("toy");
        assert_eq!(slot.list_backends(), vec!["missing", "fast", "slow"]);
        assert_eq!(slot.get_backend(), Ok(Toy::Fast));
        assert_eq!(slot.select_backend(Some("slow")), Ok(Toy::Slow));
        assert_eq!(slot.get_backend(), Ok(Toy::Slow));
        assert_eq!(slot.select_backend(Some("default")), Ok(Toy::Fast));
    }

    #[test]
    fn unknown_or_unavailable_names_fail() {
        let slot = BackendSlot::<Toy>::new("toy");
        assert!(!slot.backend_available("missing"));
        assert!(!slot.backend_available("bogus"));
        assert!(slot.backend_available("fast"));
        assert_eq!(
            slot.select_backend(Some("missing")),
            Err(Error::InvalidBackend {
                scheme: "toy",
                backend: "missing".into()
            })
        );
    }

    #[test]
    fn no_backend_available() {
        let slot = BackendSlot::<Nothing>::new("none");
        assert_eq!(
            slot.get_backend(),
            Err(Error::NoBackendAvailable { scheme: "none" })
        );
    }
}
