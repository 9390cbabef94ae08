// ==========================================
// 测试结果导入系统 - 对账引擎
// ==========================================
// 职责: 查重 + PASS/FAIL 判定
// 策略: 查重生效（已存在的三元组标记 DUPLICATE，不落库，仍进入预览）
// ==========================================

use crate::domain::test_result::{PersistedResult, ValidatedRecord};
use crate::domain::types::ResultStatus;
use crate::repository::error::RepositoryResult;
use crate::repository::test_result_repo::DuplicateLookup;
use tracing::debug;

pub struct Reconciler;

impl Reconciler {
    /// 对单条记录查重并判定状态
    ///
    /// lookup 由调用方提供；在批次事务内调用时，同批次已写入的记录也会被查到
    pub fn reconcile<L>(record: ValidatedRecord, lookup: &L) -> RepositoryResult<PersistedResult>
    where
        L: DuplicateLookup + ?Sized,
    {
        let key = record.duplicate_key();

        let status = if lookup.exists(&key)? {
            debug!(row_number = record.row_number, key = %key, "重复记录");
            ResultStatus::Duplicate
        } else {
            ResultStatus::from_value(record.value)
        };

        Ok(PersistedResult::new(record, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_result::DuplicateKey;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    struct InMemoryLookup(HashSet<DuplicateKey>);

    impl DuplicateLookup for InMemoryLookup {
        fn exists(&self, key: &DuplicateKey) -> RepositoryResult<bool> {
            Ok(self.0.contains(key))
        }
    }

    fn record(value: f64) -> ValidatedRecord {
        ValidatedRecord {
            row_number: 2,
            task: 1001,
            task_name: String::new(),
            test_part: "TP-01".to_string(),
            test_part_desc: String::new(),
            value,
            unit: String::new(),
            test_date_time: NaiveDate::from_ymd_opt(2023, 12, 31)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
            part: String::new(),
            serial: String::new(),
            store_location: String::new(),
            created_by: String::new(),
        }
    }

    #[test]
    fn test_pass_fail_boundary() {
        let lookup = InMemoryLookup(HashSet::new());

        let zero = Reconciler::reconcile(record(0.0), &lookup).unwrap();
        assert_eq!(zero.status(), ResultStatus::Pass);

        let negative = Reconciler::reconcile(record(-0.001), &lookup).unwrap();
        assert_eq!(negative.status(), ResultStatus::Fail);
    }

    #[test]
    fn test_existing_key_is_duplicate_regardless_of_value() {
        let lookup = InMemoryLookup(HashSet::from([record(0.0).duplicate_key()]));

        let result = Reconciler::reconcile(record(-3.0), &lookup).unwrap();
        assert_eq!(result.status(), ResultStatus::Duplicate);
        assert!(!result.is_persisted());
    }

    #[test]
    fn test_different_timestamp_is_not_duplicate() {
        let lookup = InMemoryLookup(HashSet::from([record(0.0).duplicate_key()]));

        let mut later = record(1.0);
        later.test_date_time = later.test_date_time + chrono::Duration::seconds(1);
        let result = Reconciler::reconcile(later, &lookup).unwrap();
        assert_eq!(result.status(), ResultStatus::Pass);
    }
}
