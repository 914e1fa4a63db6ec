//! Contains logic for reading user idle time from different environments.
//! [GenericIdleProvider] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::Result;

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait IdleTimeProvider: Send {
    /// Retrieve amount of time user has been inactive in milliseconds
    fn idle_time(&mut self) -> Result<u32>;
}

/// Serves as a cross-compatible IdleTimeProvider implementation.
pub struct GenericIdleProvider {
    inner: Box<dyn IdleTimeProvider>,
}

impl GenericIdleProvider {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsIdleProvider;
                Ok(Self {
                    inner: Box::new(WindowsIdleProvider::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxIdleProvider;
                Ok(Self {
                    inner: Box::new(LinuxIdleProvider::new()?),
                })
            }
            else {
                Err(anyhow::anyhow!(
                    "No idle time backend was compiled in, enable the `x11` or `win` feature"
                ))
            }
        }
    }
}

impl IdleTimeProvider for GenericIdleProvider {
    fn idle_time(&mut self) -> Result<u32> {
        self.inner.idle_time()
    }
}
