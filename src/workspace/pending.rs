use crate::models::TrialBalanceEntry;

/// An entry taken off the unmapped list while its mapping request is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMapping {
    pub entry: TrialBalanceEntry,
    /// Index the entry held before removal.
    pub position: usize,
    pub account_id: i64,
}

impl PendingMapping {
    pub fn take(entries: &mut Vec<TrialBalanceEntry>, entry_id: i64, account_id: i64) -> Option<Self> {
        let position = entries.iter().position(|e| e.id == entry_id)?;
        Some(PendingMapping {
            entry: entries.remove(position),
            position,
            account_id,
        })
    }

    /// Puts the entry back where it was, or at the end if the list shrank.
    pub fn restore(self, entries: &mut Vec<TrialBalanceEntry>) {
        let at = self.position.min(entries.len());
        entries.insert(at, self.entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, name: &str) -> TrialBalanceEntry {
        TrialBalanceEntry {
            id,
            account_name: name.into(),
            debit: 0.0,
            credit: 0.0,
            closing_balance: 0.0,
            unit_id: None,
        }
    }

    #[test]
    fn restore_returns_entry_to_its_slot() {
        let original = vec![entry(1, "Cash"), entry(2, "Bank"), entry(3, "Rent")];
        let mut list = original.clone();
        let pending = PendingMapping::take(&mut list, 2, 40).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(pending.position, 1);
        pending.restore(&mut list);
        assert_eq!(list, original);
    }

    #[test]
    fn unknown_entry_is_not_taken() {
        let mut list = vec![entry(1, "Cash")];
        assert!(PendingMapping::take(&mut list, 9, 40).is_none());
        assert_eq!(list.len(), 1);
    }
}
