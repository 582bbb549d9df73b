// Property tests for table-set resolution.

use pressvault::tables::TableSetPolicy;
use pressvault::BackupType;
use proptest::prelude::*;

fn table_name() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,14}"
}

proptest! {
    // An explicit table list always wins, whatever the type.
    #[test]
    fn explicit_list_always_wins(
        tables in proptest::collection::vec(table_name(), 1..8),
        type_index in 0..3usize,
    ) {
        let backup_type = [BackupType::Full, BackupType::Incremental, BackupType::Selective][type_index];
        let policy = TableSetPolicy::publishing_defaults();
        let resolved = policy.resolve(backup_type, Some(tables.clone()));
        prop_assert_eq!(resolved, tables);
    }

    // Without an explicit list, resolution is always one of the two static
    // sets, and the full set strictly contains the core set.
    #[test]
    fn resolution_is_core_or_all(type_index in 0..3usize) {
        let backup_type = [BackupType::Full, BackupType::Incremental, BackupType::Selective][type_index];
        let policy = TableSetPolicy::publishing_defaults();
        let resolved = policy.resolve(backup_type, None);

        match backup_type {
            BackupType::Full => prop_assert_eq!(resolved.as_slice(), policy.all_tables()),
            _ => prop_assert_eq!(resolved.as_slice(), policy.core_tables()),
        }

        prop_assert!(policy.all_tables().len() > policy.core_tables().len());
        for table in policy.core_tables() {
            prop_assert!(policy.all_tables().contains(table));
        }
    }

    // Custom policies keep the superset invariant whatever the inputs.
    #[test]
    fn custom_policy_full_is_superset(
        core in proptest::collection::vec(table_name(), 1..6),
        extended in proptest::collection::vec(table_name(), 1..6),
    ) {
        // Only meaningful when the extension adds at least one new table.
        prop_assume!(extended.iter().any(|t| !core.contains(t)));
        let policy = TableSetPolicy::new(core.clone(), extended);
        for table in policy.core_tables() {
            prop_assert!(policy.all_tables().contains(table));
        }
        prop_assert!(policy.all_tables().len() > core.len());
    }
}
