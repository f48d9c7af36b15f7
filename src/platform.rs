//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform per l'esecuzione dei
//! comandi esterni tramite shell: quale shell usare, come fare l'escape degli
//! argomenti e come sostituirli nei template dei driver.

use crate::error::{CompressError, Result};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};

/// Placeholder used by driver command templates
pub const PLACEHOLDER: &str = "{}";

/// Shell used to run driver command templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformShell {
    program: &'static str,
    command_flag: &'static str,
}

impl PlatformShell {
    /// Shell for the current platform
    pub fn current() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd",
                command_flag: "/C",
            }
        } else {
            Self {
                program: "/bin/sh",
                command_flag: "-c",
            }
        }
    }

    pub fn program(&self) -> &'static str {
        self.program
    }

    pub fn command_flag(&self) -> &'static str {
        self.command_flag
    }

    /// Substitute `args` into the `{}` placeholders of `template`, escaping each one.
    ///
    /// The template comes from driver code, never from user input. Arguments
    /// are spliced in as raw OS strings so non-UTF-8 paths survive intact.
    pub fn render(&self, template: &str, args: &[OsString]) -> Result<OsString> {
        let placeholders = template.matches(PLACEHOLDER).count();
        if placeholders != args.len() {
            return Err(CompressError::Template(format!(
                "{:?} expects {} argument(s), got {}",
                template,
                placeholders,
                args.len()
            )));
        }

        let mut rendered = OsString::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
        let mut pieces = template.split(PLACEHOLDER);
        if let Some(first) = pieces.next() {
            rendered.push(first);
        }
        for (piece, arg) in pieces.zip(args) {
            rendered.push(escape_arg(arg));
            rendered.push(piece);
        }
        Ok(rendered)
    }
}

impl Default for PlatformShell {
    fn default() -> Self {
        Self::current()
    }
}

/// Plain decimal numbers (`45`, `-3`, `0.5`) are passed through unquoted
pub fn is_numeric_arg(arg: &str) -> bool {
    let unsigned = arg.strip_prefix(['-', '+']).unwrap_or(arg);
    let mut parts = unsigned.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_ok = match parts.next() {
        Some(frac) => !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    };
    !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit()) && frac_ok
}

/// Escape a single argument for the platform shell
#[cfg(unix)]
pub fn escape_arg(arg: &OsStr) -> Cow<'_, OsStr> {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    if arg.to_str().is_some_and(is_numeric_arg) {
        return Cow::Borrowed(arg);
    }
    let bytes = arg.as_bytes();
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'\'');
    for &byte in bytes {
        if byte == b'\'' {
            quoted.extend_from_slice(b"'\\''");
        } else {
            quoted.push(byte);
        }
    }
    quoted.push(b'\'');
    Cow::Owned(OsString::from_vec(quoted))
}

/// Escape a single argument for the platform shell
#[cfg(windows)]
pub fn escape_arg(arg: &OsStr) -> Cow<'_, OsStr> {
    use std::os::windows::ffi::{OsStrExt, OsStringExt};

    if arg.to_str().is_some_and(is_numeric_arg) {
        return Cow::Borrowed(arg);
    }
    // cmd has no escape for these inside double quotes
    let quote = u16::from(b'"');
    let mut wide = vec![quote];
    wide.extend(arg.encode_wide().map(|unit| match unit {
        0x22 | 0x25 | 0x21 => u16::from(b' '),
        other => other,
    }));
    wide.push(quote);
    Cow::Owned(OsString::from_wide(&wide))
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl SystemInfo {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn test_numeric_detection() {
        assert!(is_numeric_arg("45"));
        assert!(is_numeric_arg("-3"));
        assert!(is_numeric_arg("0.5"));
        assert!(!is_numeric_arg(""));
        assert!(!is_numeric_arg("-"));
        assert!(!is_numeric_arg("1."));
        assert!(!is_numeric_arg("1e5"));
        assert!(!is_numeric_arg("12; rm"));
    }

    #[cfg(unix)]
    #[test]
    fn test_escape_quotes_everything_but_numbers() {
        let escaped = |arg: &str| escape_arg(OsStr::new(arg)).into_owned();
        assert_eq!(escaped("90"), "90");
        assert_eq!(escaped("/tmp/a b.png"), "'/tmp/a b.png'");
        assert_eq!(escaped("it's"), "'it'\\''s'");
        assert_eq!(escaped("$(reboot)"), "'$(reboot)'");
    }

    #[cfg(unix)]
    #[test]
    fn test_escape_keeps_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let escaped = escape_arg(OsStr::from_bytes(b"/in/it's\xff.png"));
        assert_eq!(escaped.as_bytes(), b"'/in/it'\\''s\xff.png'");
    }

    #[cfg(unix)]
    #[test]
    fn test_render_png_template() {
        let shell = PlatformShell::current();
        let cmd = shell
            .render("pngquant --quality={}-{} - < {}", &args![45, 65, "/tmp/x y.png"])
            .unwrap();
        assert_eq!(cmd, "pngquant --quality=45-65 - < '/tmp/x y.png'");
    }

    #[test]
    fn test_render_rejects_argument_mismatch() {
        let shell = PlatformShell::current();
        let err = shell.render("gifsicle -O2 {} -o -", &args![]).unwrap_err();
        assert!(matches!(err, CompressError::Template(_)));

        let err = shell.render("gifsicle", &args!["a"]).unwrap_err();
        assert!(matches!(err, CompressError::Template(_)));
    }

    #[test]
    fn test_system_info() {
        let info = SystemInfo::current();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert!(!info.family.is_empty());
    }
}
