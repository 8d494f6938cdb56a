use super::super::domain::{ApplicationStatus, BankTable};
use super::records::BankRecord;
use crate::store::Row;

const TRUTHY: &[&str] = &["true", "1", "yes", "y", "approved", "complete", "active", "on"];

/// Truthiness test for bank flag columns.
pub fn is_true(value: Option<&str>) -> bool {
    value
        .map(|raw| raw.trim().to_lowercase())
        .is_some_and(|lowered| TRUTHY.contains(&lowered.as_str()))
}

/// Standard status for a bank record. The first matching rule wins.
pub fn derive_bank_status(record: &BankRecord) -> ApplicationStatus {
    match record {
        BankRecord::Aub(r) => {
            if r.approved.is_set() {
                ApplicationStatus::Approved
            } else if r.declined.is_set() {
                ApplicationStatus::Rejected
            } else if r.incomplete.is_set() {
                ApplicationStatus::Incomplete
            } else {
                ApplicationStatus::Pending
            }
        }
        BankRecord::Bpi(r) | BankRecord::Robinsons(r) => {
            if r.approved.is_set() {
                ApplicationStatus::Approved
            } else if r.existing_bpi.is_set() || r.existing_rbank.is_set() {
                ApplicationStatus::Existing
            } else if r.in_process.is_set() {
                ApplicationStatus::InProcess
            } else if r.cancelled.is_set() {
                ApplicationStatus::Cancelled
            } else if r.denied.is_set() {
                ApplicationStatus::Rejected
            } else {
                ApplicationStatus::Pending
            }
        }
        BankRecord::Eastwest(r) => {
            if r.approved.is_set() {
                ApplicationStatus::Approved
            } else if r.cancelled.is_set() {
                ApplicationStatus::Cancelled
            } else if r.declined.is_set() {
                ApplicationStatus::Rejected
            } else {
                // An explicit pending flag and no flag at all land in the same place.
                ApplicationStatus::Pending
            }
        }
        BankRecord::Maybank(r) => {
            if r.approved.is_set() {
                ApplicationStatus::Approved
            } else if r.in_process.is_set() {
                ApplicationStatus::InProcess
            } else if r.declined.is_set() {
                ApplicationStatus::Rejected
            } else if r.cancelled.is_set() {
                ApplicationStatus::Cancelled
            } else {
                ApplicationStatus::Pending
            }
        }
        BankRecord::Metrobank(r) => {
            if r.approved.is_set() {
                ApplicationStatus::Approved
            } else if r.declined.is_set() {
                ApplicationStatus::Rejected
            } else if r.incomplete.is_set() {
                ApplicationStatus::Incomplete
            } else {
                ApplicationStatus::Pending
            }
        }
        BankRecord::Pnb(r) => {
            if r.approved.is_set() {
                ApplicationStatus::Approved
            } else {
                ApplicationStatus::Pending
            }
        }
        BankRecord::Rcbc(r) => {
            if r.approved.is_set() {
                ApplicationStatus::Approved
            } else if r.incomplete.is_set() {
                ApplicationStatus::Incomplete
            } else if r.in_process.is_set() {
                ApplicationStatus::InProcess
            } else if r.rejected.is_set() {
                ApplicationStatus::Rejected
            } else {
                ApplicationStatus::Pending
            }
        }
    }
}

/// Derives a status from a raw row and a bank name. Unknown banks and unreadable rows are pending.
pub fn derive_status_for(bank_name: &str, row: &Row) -> ApplicationStatus {
    let Some(table) = BankTable::from_name(bank_name) else {
        return ApplicationStatus::Pending;
    };

    match BankRecord::from_row(table, row) {
        Ok(record) => derive_bank_status(&record),
        Err(err) => {
            tracing::warn!(bank = table.table_name(), error = %err, "unreadable bank row");
            ApplicationStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::records::{
        AubRecord, BpiRecord, EastwestRecord, Flag, MaybankRecord, MetrobankRecord, PnbRecord,
        RcbcRecord,
    };
    use super::*;
    use serde_json::json;

    fn yes() -> Flag {
        Flag::from(true)
    }

    #[test]
    fn is_true_truth_table() {
        for value in ["TRUE", "true", "Yes", " y ", "1", "Approved", "complete", "ACTIVE", "on"] {
            assert!(is_true(Some(value)), "{value} should be truthy");
        }
        for value in ["", "0", "false", "no", "off", "pending", "n"] {
            assert!(!is_true(Some(value)), "{value} should be falsy");
        }
        assert!(!is_true(None));
    }

    #[test]
    fn bpi_existing_customer_outranks_pending() {
        let record = BankRecord::Bpi(BpiRecord {
            existing_bpi: yes(),
            approved: Flag::from(false),
            ..BpiRecord::default()
        });
        assert_eq!(derive_bank_status(&record), ApplicationStatus::Existing);
    }

    #[test]
    fn bpi_rule_order_is_priority_order() {
        let all_flags = BpiRecord {
            approved: yes(),
            existing_bpi: yes(),
            existing_rbank: yes(),
            in_process: yes(),
            cancelled: yes(),
            denied: yes(),
            ..BpiRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Bpi(all_flags.clone())),
            ApplicationStatus::Approved
        );

        let without_approval = BpiRecord {
            approved: Flag::default(),
            ..all_flags.clone()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Robinsons(without_approval.clone())),
            ApplicationStatus::Existing
        );

        let in_process = BpiRecord {
            existing_bpi: Flag::default(),
            existing_rbank: Flag::default(),
            ..without_approval
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Bpi(in_process.clone())),
            ApplicationStatus::InProcess
        );

        let cancelled = BpiRecord {
            in_process: Flag::default(),
            ..in_process
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Bpi(cancelled.clone())),
            ApplicationStatus::Cancelled
        );

        let denied = BpiRecord {
            cancelled: Flag::default(),
            ..cancelled
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Bpi(denied)),
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn each_bank_applies_its_own_rule_chain() {
        let aub = AubRecord {
            declined: yes(),
            incomplete: yes(),
            ..AubRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Aub(aub)),
            ApplicationStatus::Rejected
        );

        let eastwest = EastwestRecord {
            cancelled: yes(),
            declined: yes(),
            pending: yes(),
            ..EastwestRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Eastwest(eastwest)),
            ApplicationStatus::Cancelled
        );

        let explicit_pending = EastwestRecord {
            pending: yes(),
            ..EastwestRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Eastwest(explicit_pending)),
            ApplicationStatus::Pending
        );

        let maybank = MaybankRecord {
            in_process: yes(),
            declined: yes(),
            ..MaybankRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Maybank(maybank)),
            ApplicationStatus::InProcess
        );

        let maybank = MaybankRecord {
            declined: yes(),
            cancelled: yes(),
            ..MaybankRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Maybank(maybank)),
            ApplicationStatus::Rejected
        );

        let metrobank = MetrobankRecord {
            incomplete: yes(),
            ..MetrobankRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Metrobank(metrobank)),
            ApplicationStatus::Incomplete
        );

        let pnb = PnbRecord {
            approved: Flag::new("Approved"),
            ..PnbRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Pnb(pnb)),
            ApplicationStatus::Approved
        );

        let rcbc = RcbcRecord {
            incomplete: yes(),
            in_process: yes(),
            rejected: yes(),
            ..RcbcRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Rcbc(rcbc)),
            ApplicationStatus::Incomplete
        );

        let rcbc = RcbcRecord {
            rejected: yes(),
            ..RcbcRecord::default()
        };
        assert_eq!(
            derive_bank_status(&BankRecord::Rcbc(rcbc)),
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn derivation_is_pure_and_ignores_unrelated_columns() {
        let base = json!({ "id": 1, "client_name": "Ana Reyes", "in_process": "yes" });
        let row = base.as_object().expect("object").clone();
        let first = derive_status_for("maybank", &row);
        let second = derive_status_for("maybank", &row);
        assert_eq!(first, ApplicationStatus::InProcess);
        assert_eq!(first, second);

        let mut noisy = row.clone();
        noisy.insert("remarks".to_string(), json!("approved by phone"));
        noisy.insert("client_name".to_string(), json!("Someone Else"));
        noisy.insert("denied".to_string(), json!(true));
        assert_eq!(derive_status_for("maybank", &noisy), first);
    }

    #[test]
    fn unknown_bank_names_default_to_pending() {
        let row = json!({ "id": 1, "approved": true });
        let row = row.as_object().expect("object").clone();
        assert_eq!(derive_status_for("citibank", &row), ApplicationStatus::Pending);
        assert_eq!(derive_status_for("", &row), ApplicationStatus::Pending);
        assert_eq!(derive_status_for("PNB", &row), ApplicationStatus::Approved);
    }
}
