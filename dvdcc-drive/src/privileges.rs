//! Scoped privilege elevation.
//!
//! The vendor 0xE7 command is only accepted from root, so the binary is
//! installed setuid-root and runs with the real user's privileges the rest
//! of the time. [`PrivilegeGuard`] raises the effective uid to root and
//! restores the real uid when dropped, so elevation never outlives the
//! single command that needs it, on any exit path.

/// RAII guard holding root effective-uid. Created immediately before a
/// vendor command is submitted; dropping it restores the real uid.
pub struct PrivilegeGuard {
    elevated: bool,
}

impl PrivilegeGuard {
    /// Raise the effective uid to root.
    ///
    /// Best effort: when the process is not setuid-root the seteuid call
    /// fails and the guard is inert. The vendor command itself then fails
    /// with the drive's own permission error, which is the more useful
    /// diagnostic.
    pub fn elevate() -> Self {
        let uid = unsafe { libc::getuid() };
        if uid == 0 {
            return Self { elevated: false };
        }
        let status = unsafe { libc::seteuid(0) };
        if status != 0 {
            log::debug!("seteuid(0) failed; continuing without elevation");
            return Self { elevated: false };
        }
        Self { elevated: true }
    }
}

impl Drop for PrivilegeGuard {
    fn drop(&mut self) {
        if self.elevated {
            let uid = unsafe { libc::getuid() };
            unsafe { libc::seteuid(uid) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_effective_uid() {
        let before = unsafe { libc::geteuid() };
        {
            let _guard = PrivilegeGuard::elevate();
            // Elevation may or may not succeed depending on how the test
            // binary is installed; either way the drop must restore state.
        }
        let after = unsafe { libc::geteuid() };
        assert_eq!(before, after);
    }
}
