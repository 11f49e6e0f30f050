//! OpenProcess + TerminateProcess.

use super::ProcessTerminator;
use crate::error::TerminationError;
use std::time::Duration;
use windows::Win32::Foundation::{
    CloseHandle, ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, WAIT_OBJECT_0,
};
use windows::Win32::System::Threading::{
    OpenProcess, TerminateProcess, WaitForSingleObject, PROCESS_SYNCHRONIZE, PROCESS_TERMINATE,
};

pub struct SystemTerminator;

fn classify(e: windows::core::Error) -> TerminationError {
    if e.code() == ERROR_ACCESS_DENIED.to_hresult() {
        TerminationError::PermissionDenied
    } else if e.code() == ERROR_INVALID_PARAMETER.to_hresult() {
        // OpenProcess reports an unknown pid as an invalid parameter
        TerminationError::NotFound
    } else {
        TerminationError::Os(std::io::Error::other(e.to_string()))
    }
}

impl ProcessTerminator for SystemTerminator {
    fn send_terminate(&self, pid: u32) -> Result<(), TerminationError> {
        // SAFETY: the handle is checked by OpenProcess and closed on every path.
        unsafe {
            let handle = OpenProcess(PROCESS_TERMINATE, false, pid).map_err(classify)?;
            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);
            result.map_err(classify)
        }
    }

    fn wait_exit(&self, pid: u32, grace: Duration) -> bool {
        let millis = u32::try_from(grace.as_millis()).unwrap_or(u32::MAX);
        // SAFETY: as above; a failed open means the process is already gone.
        unsafe {
            match OpenProcess(PROCESS_SYNCHRONIZE, false, pid) {
                Ok(handle) => {
                    let waited = WaitForSingleObject(handle, millis);
                    let _ = CloseHandle(handle);
                    waited == WAIT_OBJECT_0
                }
                Err(_) => true,
            }
        }
    }
}
