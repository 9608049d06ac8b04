// src/claim/account.rs
//! Destination account validation.
//!
//! Account ids are dot-separated parts. Each part is lowercase letters and
//! digits, optionally split by single `-` or `_` separators that never open
//! or close the part. Examples: `alice.near`, `bob_smith-01.testnet`.

use crate::error::DropError;
use crate::ledger::RemoteAccessor;
use crate::params::{ACCOUNT_ID_MAX_LEN, ACCOUNT_ID_MIN_LEN};

/// Check the naming rule only; no network access.
pub fn is_valid_account_id(account_id: &str) -> bool {
    let len = account_id.len();
    if !(ACCOUNT_ID_MIN_LEN..=ACCOUNT_ID_MAX_LEN).contains(&len) {
        return false;
    }
    account_id.split('.').all(is_valid_part)
}

fn is_valid_part(part: &str) -> bool {
    let mut previous_was_separator = true;
    for b in part.bytes() {
        if is_separator(b) {
            if previous_was_separator {
                return false;
            }
            previous_was_separator = true;
        } else if is_lower_alnum(b) {
            previous_was_separator = false;
        } else {
            return false;
        }
    }
    // Empty parts and trailing separators both leave the flag set
    !previous_was_separator
}

#[inline]
fn is_lower_alnum(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

#[inline]
fn is_separator(b: u8) -> bool {
    b == b'-' || b == b'_'
}

/// Naming rule, then existence on the ledger.
pub async fn validate_account_id(accessor: &RemoteAccessor, account_id: &str) -> Result<(), DropError> {
    if !is_valid_account_id(account_id) {
        return Err(DropError::InvalidAccountId("Account Id is invalid".to_string()));
    }
    accessor
        .view_account(account_id)
        .await
        .map_err(|_| DropError::InvalidAccountId("Account Id does not exist".to_string()))?;
    Ok(())
}
