//! Host platform identification.

/// OS name and release, e.g. `"Linux 6.8.0"`. `name_override` replaces the
/// OS name.
#[must_use]
pub fn platform_version(name_override: Option<&str>) -> String {
    let (name, release) = os_name_and_release();
    format!("{} {release}", name_override.unwrap_or(&name))
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn os_name_and_release() -> (String, String) {
    // SAFETY: uname only writes into the zeroed struct we own; the fields
    // are NUL-terminated on success.
    unsafe {
        let mut info: libc::utsname = std::mem::zeroed();
        if libc::uname(&mut info) == 0 {
            let field = |raw: &[libc::c_char]| {
                std::ffi::CStr::from_ptr(raw.as_ptr())
                    .to_string_lossy()
                    .into_owned()
            };
            return (field(&info.sysname), field(&info.release));
        }
    }
    tracing::warn!("uname failed, reporting a generic platform version");
    fallback()
}

#[cfg(not(unix))]
fn os_name_and_release() -> (String, String) {
    fallback()
}

fn fallback() -> (String, String) {
    (std::env::consts::OS.to_string(), "unknown".to_string())
}
