//! Leave balance ledger
//!
//! Balances are keyed by (user, leave type, year). Approval debits the
//! balance of the request's start-date year; a debit that would drive the
//! remainder negative is refused.

use shared::models::{LeaveBalance, LeaveType};

use super::LeaveError;

/// Opening balance for a year with no row yet
///
/// `allocated = maxDaysPerYear`, plus last year's positive remainder when the
/// type carries forward.
pub fn opening_balance(
    id: String,
    user_id: &str,
    leave_type: &LeaveType,
    year: i32,
    previous: Option<&LeaveBalance>,
    now_ms: i64,
) -> LeaveBalance {
    let carried = if leave_type.carry_forward {
        previous.map(|p| p.remaining_days().max(0)).unwrap_or(0)
    } else {
        0
    };
    LeaveBalance {
        id,
        user_id: user_id.to_string(),
        leave_type_id: leave_type.id.clone(),
        year,
        allocated_days: leave_type.max_days_per_year + carried,
        used_days: 0,
        updated_at: now_ms,
    }
}

/// Debit `days` from `balance`
pub fn debit(balance: &LeaveBalance, days: i32, now_ms: i64) -> Result<LeaveBalance, LeaveError> {
    let remaining = balance.remaining_days();
    if days > remaining {
        return Err(LeaveError::InsufficientBalance {
            requested: days,
            remaining,
        });
    }
    let mut next = balance.clone();
    next.used_days += days;
    next.updated_at = now_ms;
    Ok(next)
}

/// Change the allocation, keeping used days
pub fn reallocate(
    balance: &LeaveBalance,
    allocated_days: i32,
    now_ms: i64,
) -> Result<LeaveBalance, LeaveError> {
    if allocated_days < balance.used_days {
        return Err(LeaveError::InsufficientBalance {
            requested: balance.used_days,
            remaining: allocated_days,
        });
    }
    let mut next = balance.clone();
    next.allocated_days = allocated_days;
    next.updated_at = now_ms;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annual(carry_forward: bool) -> LeaveType {
        LeaveType {
            id: "annual".into(),
            name: "Annual Leave".into(),
            description: None,
            max_days_per_year: 25,
            carry_forward,
            is_active: true,
            created_at: 0,
        }
    }

    fn balance(allocated: i32, used: i32) -> LeaveBalance {
        LeaveBalance {
            id: "b".into(),
            user_id: "u1".into(),
            leave_type_id: "annual".into(),
            year: 2024,
            allocated_days: allocated,
            used_days: used,
            updated_at: 0,
        }
    }

    #[test]
    fn test_opening_balance_with_carry_forward() {
        let prev = balance(25, 20);
        let open = opening_balance("n".into(), "u1", &annual(true), 2025, Some(&prev), 1);
        assert_eq!(open.allocated_days, 30);
        assert_eq!(open.used_days, 0);
        assert_eq!(open.year, 2025);

        let open = opening_balance("n".into(), "u1", &annual(false), 2025, Some(&prev), 1);
        assert_eq!(open.allocated_days, 25);
    }

    #[test]
    fn test_negative_remainder_not_carried() {
        let prev = balance(5, 8);
        let open = opening_balance("n".into(), "u1", &annual(true), 2025, Some(&prev), 1);
        assert_eq!(open.allocated_days, 25);
    }

    #[test]
    fn test_debit_exact_remainder() {
        let next = debit(&balance(10, 9), 1, 5).unwrap();
        assert_eq!(next.used_days, 10);
        assert_eq!(next.remaining_days(), 0);
        assert_eq!(next.updated_at, 5);
    }

    #[test]
    fn test_debit_refuses_overdraft() {
        assert_eq!(
            debit(&balance(10, 9), 2, 5),
            Err(LeaveError::InsufficientBalance {
                requested: 2,
                remaining: 1
            })
        );
    }

    #[test]
    fn test_reallocate_below_used() {
        assert!(reallocate(&balance(10, 6), 5, 1).is_err());
        assert_eq!(reallocate(&balance(10, 6), 6, 1).unwrap().allocated_days, 6);
    }
}
