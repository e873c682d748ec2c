//! Result shapes shared by every type query.
//!
//! "This conversion is not allowed" is ordinary control flow and is returned
//! as a [`BoolResult`]. Operations that produce a type return a
//! [`TypeResult`]: `Ok(Some(ty))` on success, `Ok(None)` when the operation
//! simply does not apply, and `Err(TypeError)` when there is a specific
//! diagnostic to report. Broken compiler invariants are neither: they go
//! through `tsol_assert!`.

use std::fmt;

use crate::ty::TypeId;

/// A yes/no answer that may explain a "no".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolResult {
    value: bool,
    message: Option<String>,
}

impl BoolResult {
    pub fn ok() -> Self {
        Self {
            value: true,
            message: None,
        }
    }

    /// A plain "no" without explanation.
    pub fn no() -> Self {
        Self {
            value: false,
            message: None,
        }
    }

    /// A "no" with a human-readable reason.
    pub fn err(reason: impl Into<String>) -> Self {
        Self {
            value: false,
            message: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.value
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl From<bool> for BoolResult {
    fn from(value: bool) -> Self {
        if value {
            Self::ok()
        } else {
            Self::no()
        }
    }
}

/// A diagnostic produced while computing a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// An operator applied to operands it does not accept.
    Operator { message: String },
    /// A literal that cannot be represented where it is used.
    Literal { message: String },
    /// Constant evaluation exceeded the rational precision budget.
    Precision { bits: u32 },
    /// A type with no representation in an external signature.
    Interface { message: String },
    /// A type the cell encoder cannot lay out.
    Encoding { message: String },
}

impl TypeError {
    pub fn operator(message: impl Into<String>) -> Self {
        TypeError::Operator {
            message: message.into(),
        }
    }

    pub fn literal(message: impl Into<String>) -> Self {
        TypeError::Literal {
            message: message.into(),
        }
    }

    pub fn interface(message: impl Into<String>) -> Self {
        TypeError::Interface {
            message: message.into(),
        }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        TypeError::Encoding {
            message: message.into(),
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            TypeError::Operator { .. } => "T0001",
            TypeError::Literal { .. } => "T0002",
            TypeError::Precision { .. } => "T0003",
            TypeError::Interface { .. } => "T0004",
            TypeError::Encoding { .. } => "T0005",
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Operator { message }
            | TypeError::Literal { message }
            | TypeError::Interface { message }
            | TypeError::Encoding { message } => write!(f, "{}", message),
            TypeError::Precision { bits } => {
                write!(f, "Precision of rational constants is limited to {} bits.", bits)
            }
        }
    }
}

impl std::error::Error for TypeError {}

/// Result of a type-producing query.
pub type TypeResult = Result<Option<TypeId>, TypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_result_carries_reason() {
        let no = BoolResult::err("Literal is larger than the type.");
        assert!(!no.is_ok());
        assert_eq!(no.message(), Some("Literal is larger than the type."));
        assert_eq!(BoolResult::no().message(), None);
        assert!(BoolResult::from(true).is_ok());
    }

    #[test]
    fn precision_error_message() {
        let err = TypeError::Precision { bits: 4096 };
        assert_eq!(
            err.to_string(),
            "Precision of rational constants is limited to 4096 bits."
        );
        assert_eq!(err.code(), "T0003");
    }
}
