//! Path parameter coercion.
//!
//! # Responsibilities
//! - Describe each trailing handler argument with a [`ParamKind`]
//! - Turn a raw captured string into the typed argument
//! - Report failures as [`RouteError::InvalidParam`] with the position
//!
//! # Design Decisions
//! - Integers are parsed base 10 and signed
//! - Custom validation goes through the [`Valid`] wrapper so any
//!   `Validate + Default` type can be a handler argument
//! - Strings are passed through untouched

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::Serialize;

use crate::routing::error::{RouteError, RouteResult};

/// Shape of one trailing handler argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Integer,
    String,
    Validatable,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Integer => "int",
            ParamKind::String => "string",
            ParamKind::Validatable => "validatable",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type that can be built from a single raw path value.
pub trait FromParam: Sized {
    const KIND: ParamKind;

    /// Convert the raw value, returning the rejection reason on failure.
    fn from_param(raw: &str) -> Result<Self, String>;
}

macro_rules! impl_from_param_int {
    ($($ty:ty),*) => {
        $(
            impl FromParam for $ty {
                const KIND: ParamKind = ParamKind::Integer;

                fn from_param(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

impl_from_param_int!(i8, i16, i32, i64, i128, isize);

impl FromParam for String {
    const KIND: ParamKind = ParamKind::String;

    fn from_param(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

/// Custom validation for a path value.
///
/// The binder starts from `Default::default()` and calls `validate` with the
/// raw value; the validator may keep whatever it parsed.
pub trait Validate: Default {
    fn validate(&mut self, raw: &str) -> bool;
}

/// Handler argument holding a value that passed [`Validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Valid<T>(pub T);

impl<T> Valid<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Valid<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Valid<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Validate> FromParam for Valid<T> {
    const KIND: ParamKind = ParamKind::Validatable;

    fn from_param(raw: &str) -> Result<Self, String> {
        let mut value = T::default();
        if value.validate(raw) {
            Ok(Valid(value))
        } else {
            Err("rejected by validator".to_string())
        }
    }
}

/// Reject a call whose captured value count differs from the handler's arity.
pub fn check_arity(expected: usize, actual: usize) -> RouteResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RouteError::NotFoundHandler { expected, actual })
    }
}

/// Coerce the raw value at `position` into `T`.
pub fn bind<T: FromParam>(position: usize, raw: &str) -> RouteResult<T> {
    T::from_param(raw).map_err(|reason| RouteError::InvalidParam {
        position,
        value: raw.to_string(),
        reason,
    })
}
