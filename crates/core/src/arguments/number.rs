use std::fmt;

use futures::future::BoxFuture;

use super::{ArgumentType, loaded};
use crate::context::EntryPoint;
use crate::error::{CommandError, CommandSyntaxError, RangeError, RangeViolation, SyntaxErrorKind};
use crate::reader::StringReader;

mod sealed {
    pub trait Sealed {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
}

/// Numeric types usable with [`NumberArgument`].
///
/// Implemented for `i64` and `f64` only.
pub trait Number:
    sealed::Sealed + Copy + PartialOrd + fmt::Display + fmt::Debug + Send + Sync + 'static
{
    /// Name used in error messages.
    const NAME: &'static str;
    /// Smallest representable value.
    const MIN: Self;
    /// Largest representable value.
    const MAX: Self;

    /// Read one value at the cursor.
    fn read(reader: &mut StringReader) -> Result<Self, CommandSyntaxError>;

    /// Representative inputs.
    fn examples() -> &'static [&'static str];
}

impl Number for i64 {
    const NAME: &'static str = "integer";
    const MIN: Self = i64::MIN;
    const MAX: Self = i64::MAX;

    fn read(reader: &mut StringReader) -> Result<Self, CommandSyntaxError> {
        reader.read_int()
    }

    fn examples() -> &'static [&'static str] {
        &["0", "123", "-123"]
    }
}

impl Number for f64 {
    const NAME: &'static str = "float";
    const MIN: Self = f64::MIN;
    const MAX: Self = f64::MAX;

    fn read(reader: &mut StringReader) -> Result<Self, CommandSyntaxError> {
        reader.read_float()
    }

    fn examples() -> &'static [&'static str] {
        &["0", "1.2", ".5", "-1", "-.5", "-1234.56"]
    }
}

/// A number within inclusive bounds.
#[derive(Debug, Clone, Copy)]
pub struct NumberArgument<N: Number> {
    min: N,
    max: N,
}

/// Bounded `i64` argument.
pub type IntegerArgument = NumberArgument<i64>;
/// Bounded `f64` argument.
pub type FloatArgument = NumberArgument<f64>;

impl NumberArgument<i64> {
    /// Any `i64`.
    pub fn integer() -> Self {
        Self::new()
    }
}

impl NumberArgument<f64> {
    /// Any finite `f64`.
    pub fn float() -> Self {
        Self::new()
    }
}

impl<N: Number> Default for NumberArgument<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Number> NumberArgument<N> {
    /// Unbounded argument.
    pub fn new() -> Self {
        Self {
            min: N::MIN,
            max: N::MAX,
        }
    }

    /// Values in `min..=max`.
    pub fn between(min: N, max: N) -> Self {
        Self { min, max }
    }

    /// Set the inclusive lower bound.
    pub fn with_min(mut self, min: N) -> Self {
        self.min = min;
        self
    }

    /// Set the inclusive upper bound.
    pub fn with_max(mut self, max: N) -> Self {
        self.max = max;
        self
    }

    /// Inclusive lower bound.
    pub fn min(&self) -> N {
        self.min
    }

    /// Inclusive upper bound.
    pub fn max(&self) -> N {
        self.max
    }

    fn check(&self, value: N) -> Option<RangeError> {
        let violation = if value < self.min {
            RangeViolation::TooLow
        } else if value > self.max {
            RangeViolation::TooHigh
        } else {
            return None;
        };
        Some(RangeError {
            what: N::NAME,
            violation,
            min: self.min.to_string(),
            max: self.max.to_string(),
            actual: value.to_string(),
        })
    }
}

impl<N: Number> ArgumentType for NumberArgument<N> {
    type Parsed = N;
    type Output = N;

    fn parse(
        &self,
        _entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<N, CommandSyntaxError> {
        let start = reader.cursor();
        let value = N::read(reader)?;
        if let Some(range) = self.check(value) {
            reader.rewind(start);
            return Err(reader.error(SyntaxErrorKind::OutOfRange(range)));
        }
        Ok(value)
    }

    fn load(&self, _entry: &EntryPoint, parsed: N) -> BoxFuture<'static, Result<N, CommandError>> {
        loaded(parsed)
    }

    fn examples(&self) -> Vec<String> {
        N::examples().iter().map(|s| (*s).to_string()).collect()
    }
}
