//! # Utility Functions Module
//!
//! Helpers for building the positional argument lists handed to
//! [`ProcessRunner::run`](crate::process::ProcessRunner::run).
//!
//! Arguments are `OsString`s: paths keep their exact bytes even when they are
//! not valid UTF-8, numbers are rendered in decimal.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Conversion into one shell argument
pub trait ToArg {
    fn to_arg(&self) -> OsString;
}

impl ToArg for OsStr {
    fn to_arg(&self) -> OsString {
        self.to_os_string()
    }
}

impl ToArg for OsString {
    fn to_arg(&self) -> OsString {
        self.clone()
    }
}

impl ToArg for Path {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

impl ToArg for PathBuf {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

impl ToArg for str {
    fn to_arg(&self) -> OsString {
        OsString::from(self)
    }
}

impl ToArg for String {
    fn to_arg(&self) -> OsString {
        OsString::from(self)
    }
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> OsString {
        (**self).to_arg()
    }
}

macro_rules! numeric_args {
    ($($ty:ty),*) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> OsString {
                    OsString::from(self.to_string())
                }
            }
        )*
    };
}

numeric_args!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

/// Build an argument vector from mixed values (paths, strings, numbers).
///
/// ```rust
/// use compressit::args;
///
/// let quality = 90;
/// let staged = std::path::Path::new("/tmp/a.jpg");
/// let args = args![staged, quality];
/// assert_eq!(args, vec!["/tmp/a.jpg", "90"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        {
            let args: ::std::vec::Vec<::std::ffi::OsString> =
                ::std::vec![$($crate::utils::ToArg::to_arg(&$item)),*];
            args
        }
    };
}
