//! Shared primitive types used across the entire engine.

/// A stable transaction identifier. Doubles as the case id for the
/// review case opened against that transaction.
pub type TxnId = String;

/// A stable user identifier.
pub type UserId = String;
