//! Host compatibility checks, run before any host state is touched.

use cordon_common::error::{CordonError, Result};
use nix::sys::utsname::uname;

/// Validates the kernel release string and machine architecture.
///
/// # Errors
///
/// Returns [`CordonError::HostCompatibility`] if `uname(2)` fails,
/// the release does not parse as `major.minor`, or the machine does
/// not match the architecture this binary was built for.
pub fn validate_host() -> Result<()> {
    let uts = uname().map_err(|errno| CordonError::HostCompatibility {
        message: format!("uname failed: {errno}"),
    })?;

    let release = uts.release().to_string_lossy().into_owned();
    let (major, minor) =
        parse_release(&release).ok_or_else(|| CordonError::HostCompatibility {
            message: format!("unparsable kernel release: {release}"),
        })?;

    let machine = uts.machine().to_string_lossy().into_owned();
    if machine != std::env::consts::ARCH {
        return Err(CordonError::HostCompatibility {
            message: format!(
                "expected {} machine, host reports {machine}",
                std::env::consts::ARCH
            ),
        });
    }

    tracing::info!(release = %release, machine = %machine, major, minor, "host validated");
    Ok(())
}

/// Parses the leading `major.minor` out of a kernel release string
/// such as `6.8.0-41-generic`.
fn parse_release(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor_digits: String = parts
        .next()?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let minor = minor_digits.parse().ok()?;
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_releases() {
        assert_eq!(parse_release("6.8"), Some((6, 8)));
        assert_eq!(parse_release("5.15.0"), Some((5, 15)));
    }

    #[test]
    fn parses_distribution_suffixes() {
        assert_eq!(parse_release("6.8.0-41-generic"), Some((6, 8)));
        assert_eq!(parse_release("5.10.0-rc1"), Some((5, 10)));
    }

    #[test]
    fn rejects_weird_release_formats() {
        assert_eq!(parse_release(""), None);
        assert_eq!(parse_release("linux"), None);
        assert_eq!(parse_release("6"), None);
        assert_eq!(parse_release("6.x"), None);
    }

    #[test]
    fn current_host_passes_validation() {
        // Runs on a real kernel in CI; the check is read-only.
        assert!(validate_host().is_ok());
    }
}
