use anyhow::{anyhow, Result};
use tracing::error;
use windows::Win32::{
    System::SystemInformation::GetTickCount64,
    UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO},
};

use super::IdleTimeProvider;

pub fn get_idle_time() -> Result<u32> {
    let mut last: LASTINPUTINFO = LASTINPUTINFO {
        cbSize: size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };
    let is_success = unsafe { GetLastInputInfo(&mut last) };
    if !is_success.as_bool() {
        return Err(anyhow!("Failed to retrieve user idle time"));
    }

    // dwTime is a 32 bit tick count, it wraps after ~49 days of uptime.
    let tick_count = unsafe { GetTickCount64() } as u32;
    Ok(tick_count.wrapping_sub(last.dwTime))
}

#[derive(Default)]
pub struct WindowsIdleProvider;

impl WindowsIdleProvider {
    pub fn new() -> Self {
        Self
    }
}

impl IdleTimeProvider for WindowsIdleProvider {
    fn idle_time(&mut self) -> Result<u32> {
        get_idle_time().inspect_err(|e| error!("Failed to get idle time {e:?}"))
    }
}
