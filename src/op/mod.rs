//! Operators parameterising the engine's semirings
//!
//! An operator carries a stable name, a host-side callable, and a source
//! snippet in the accelerator's kernel language (WGSL). The snippet is
//! the body of a function over operands `a`, `b` (binary), `x` (select /
//! unary); the identifier `TYPE` inside a snippet is substituted with the
//! concrete element type at kernel build time. Snippets must be pure.
//!
//! Operators are immutable and shared by reference ([`OpBinaryRef`] and
//! friends are `Arc`s); every holder keeps the operator alive.

use crate::dtype::Element;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Shared reference to a binary operator
pub type OpBinaryRef<T> = Arc<OpBinary<T>>;
/// Shared reference to a select operator
pub type OpSelectRef<T> = Arc<OpSelect<T>>;
/// Shared reference to a unary operator
pub type OpUnaryRef<T> = Arc<OpUnary<T>>;

/// A named binary function `T × T → T`
pub struct OpBinary<T: Element> {
    name: Cow<'static, str>,
    source: Cow<'static, str>,
    func: Arc<dyn Fn(T, T) -> T + Send + Sync>,
}

impl<T: Element> OpBinary<T> {
    /// Create an operator from a name, a WGSL body over `a` and `b`, and
    /// a host callable
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
        func: impl Fn(T, T) -> T + Send + Sync + 'static,
    ) -> OpBinaryRef<T> {
        Arc::new(Self {
            name: name.into(),
            source: source.into(),
            func: Arc::new(func),
        })
    }

    /// Operator name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kernel-language body of the operator
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Apply the host callable
    #[inline]
    pub fn apply(&self, a: T, b: T) -> T {
        (self.func)(a, b)
    }
}

impl<T: Element> fmt::Debug for OpBinary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpBinary").field("name", &self.name).finish()
    }
}

/// A named selection predicate `T → bool`
pub struct OpSelect<T: Element> {
    name: Cow<'static, str>,
    source: Cow<'static, str>,
    func: Arc<dyn Fn(T) -> bool + Send + Sync>,
}

impl<T: Element> OpSelect<T> {
    /// Create a predicate from a name, a WGSL body over `x`, and a host
    /// callable
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
        func: impl Fn(T) -> bool + Send + Sync + 'static,
    ) -> OpSelectRef<T> {
        Arc::new(Self {
            name: name.into(),
            source: source.into(),
            func: Arc::new(func),
        })
    }

    /// Operator name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kernel-language body of the predicate
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Apply the host callable
    #[inline]
    pub fn test(&self, x: T) -> bool {
        (self.func)(x)
    }
}

impl<T: Element> fmt::Debug for OpSelect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpSelect").field("name", &self.name).finish()
    }
}

/// A named unary function `T → T`
pub struct OpUnary<T: Element> {
    name: Cow<'static, str>,
    source: Cow<'static, str>,
    func: Arc<dyn Fn(T) -> T + Send + Sync>,
}

impl<T: Element> OpUnary<T> {
    /// Create an operator from a name, a WGSL body over `x`, and a host
    /// callable
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
        func: impl Fn(T) -> T + Send + Sync + 'static,
    ) -> OpUnaryRef<T> {
        Arc::new(Self {
            name: name.into(),
            source: source.into(),
            func: Arc::new(func),
        })
    }

    /// Operator name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kernel-language body of the operator
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Apply the host callable
    #[inline]
    pub fn apply(&self, x: T) -> T {
        (self.func)(x)
    }
}

impl<T: Element> fmt::Debug for OpUnary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpUnary").field("name", &self.name).finish()
    }
}

// ============================================================================
// Predefined operators
// ============================================================================

/// Arithmetic addition
pub fn plus<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new("plus", "return a + b;", |a, b| a + b)
}

/// Arithmetic multiplication
pub fn times<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new("times", "return a * b;", |a, b| a * b)
}

/// Minimum of two values
pub fn min<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new(
        "min",
        "return min(a, b);",
        |a, b| if a <= b { a } else { b },
    )
}

/// Maximum of two values
pub fn max<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new(
        "max",
        "return max(a, b);",
        |a, b| if a >= b { a } else { b },
    )
}

/// Logical AND over nonzero-ness; yields one or zero
pub fn land<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new(
        "land",
        "return select(TYPE(0), TYPE(1), (a != TYPE(0)) && (b != TYPE(0)));",
        |a, b| {
            if a != T::zero() && b != T::zero() {
                T::one()
            } else {
                T::zero()
            }
        },
    )
}

/// Logical OR over nonzero-ness; yields one or zero
pub fn lor<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new(
        "lor",
        "return select(TYPE(0), TYPE(1), (a != TYPE(0)) || (b != TYPE(0)));",
        |a, b| {
            if a != T::zero() || b != T::zero() {
                T::one()
            } else {
                T::zero()
            }
        },
    )
}

/// Left projection: `first(a, b) = a`
pub fn first<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new("first", "return a;", |a, _| a)
}

/// Right projection: `second(a, b) = b` (last write wins)
pub fn second<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new("second", "return b;", |_, b| b)
}

/// Absolute difference `|a - b|`, order-safe for unsigned types
pub fn absdiff<T: Element>() -> OpBinaryRef<T> {
    OpBinary::new(
        "absdiff",
        "if (a >= b) { return a - b; } return b - a;",
        |a, b| if a >= b { a - b } else { b - a },
    )
}

/// Selects values different from zero
pub fn nonzero<T: Element>() -> OpSelectRef<T> {
    OpSelect::new("nonzero", "return x != TYPE(0);", |x| x != T::zero())
}

/// Selects values equal to zero
pub fn equal_zero<T: Element>() -> OpSelectRef<T> {
    OpSelect::new("equal_zero", "return x == TYPE(0);", |x| x == T::zero())
}

/// Selects everything
pub fn always_true<T: Element>() -> OpSelectRef<T> {
    OpSelect::new("always_true", "return true;", |_| true)
}

/// Identity map
pub fn identity<T: Element>() -> OpUnaryRef<T> {
    OpUnary::new("identity", "return x;", |x| x)
}

/// Multiplicative inverse, zero-guarded: `recip(0) = 0`
pub fn reciprocal<T: Element>() -> OpUnaryRef<T> {
    OpUnary::new(
        "reciprocal",
        "return select(TYPE(0), TYPE(1) / x, x != TYPE(0));",
        |x: T| {
            if x == T::zero() {
                T::zero()
            } else {
                T::from_f64(1.0 / x.to_f64())
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_ops() {
        assert_eq!(plus::<i32>().apply(3, 4), 7);
        assert_eq!(times::<f32>().apply(2.0, 0.5), 1.0);
        assert_eq!(min::<f32>().apply(1.5, -2.0), -2.0);
        assert_eq!(max::<u32>().apply(7, 9), 9);
    }

    #[test]
    fn test_logical_ops() {
        assert_eq!(land::<i32>().apply(2, 3), 1);
        assert_eq!(land::<i32>().apply(2, 0), 0);
        assert_eq!(lor::<i32>().apply(0, 3), 1);
        assert_eq!(lor::<i32>().apply(0, 0), 0);
    }

    #[test]
    fn test_projections() {
        assert_eq!(first::<i32>().apply(1, 2), 1);
        assert_eq!(second::<i32>().apply(1, 2), 2);
    }

    #[test]
    fn test_absdiff_unsigned_safe() {
        assert_eq!(absdiff::<u32>().apply(3, 10), 7);
        assert_eq!(absdiff::<u32>().apply(10, 3), 7);
    }

    #[test]
    fn test_selects() {
        assert!(nonzero::<f32>().test(0.5));
        assert!(!nonzero::<f32>().test(0.0));
        assert!(equal_zero::<i32>().test(0));
        assert!(always_true::<i32>().test(-5));
    }

    #[test]
    fn test_reciprocal_zero_guard() {
        assert_eq!(reciprocal::<f32>().apply(4.0), 0.25);
        assert_eq!(reciprocal::<f32>().apply(0.0), 0.0);
    }

    #[test]
    fn test_names_and_sources() {
        let op = plus::<i32>();
        assert_eq!(op.name(), "plus");
        assert_eq!(op.source(), "return a + b;");
    }
}
