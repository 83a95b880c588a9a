//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised while constructing or mutating domain entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An argument was empty, blank, undefined or otherwise unusable.
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    /// A numeric argument was outside its allowed range.
    #[error("Argument '{argument}' out of range: {reason}")]
    OutOfRange {
        argument: &'static str,
        reason: String,
    },

    /// A required value was never supplied.
    #[error("Required argument '{argument}' was not provided")]
    NullArgument { argument: &'static str },

    /// The order cannot move between the two statuses.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },
}

impl DomainError {
    pub(crate) fn invalid(argument: &'static str, reason: impl Into<String>) -> Self {
        DomainError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(argument: &'static str, reason: impl Into<String>) -> Self {
        DomainError::OutOfRange {
            argument,
            reason: reason.into(),
        }
    }
}

/// Argument guards shared by the entity constructors.
pub(crate) mod guard {
    use super::DomainError;
    use crate::Money;

    pub(crate) fn not_empty_id(
        argument: &'static str,
        is_empty: bool,
    ) -> Result<(), DomainError> {
        if is_empty {
            return Err(DomainError::invalid(argument, "cannot be empty"));
        }
        Ok(())
    }

    pub(crate) fn not_blank(argument: &'static str, value: &str) -> Result<(), DomainError> {
        if value.trim().is_empty() {
            return Err(DomainError::invalid(argument, "cannot be empty or whitespace"));
        }
        Ok(())
    }

    pub(crate) fn not_negative(argument: &'static str, amount: Money) -> Result<(), DomainError> {
        if amount.is_negative() {
            return Err(DomainError::out_of_range(
                argument,
                format!("{amount} cannot be negative"),
            ));
        }
        Ok(())
    }
}
