//! Pipeline Module
//!
//! Pass drivers: the sampling pass that records SMART samples and the
//! continuity pass that compares them.

pub mod checker;
pub mod sampler;

#[cfg(test)]
pub(crate) mod testing;

pub use checker::{CheckOutcome, CheckSettings, ContinuityChecker};
pub use sampler::{PersistOutcome, Sampler};

#[cfg(test)]
mod tests {
    use super::testing::{disk, sata_report, RecordingNotifier, ScriptedFetcher};
    use super::*;
    use crate::continuity::Classification;
    use crate::domain::ports::Severity;
    use crate::storage::{SqliteEventStore, TraceFile};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_restart_then_tampering_scenario() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(
            SqliteEventStore::open(tmp.path().join("dbc.db"), std::time::Duration::from_secs(1))
                .unwrap(),
        );
        let fetcher = Arc::new(ScriptedFetcher::new().with_report("sda", sata_report(5), 0));
        let notifier = Arc::new(RecordingNotifier::default());

        let boot = Utc.timestamp_opt(1_720_196_915, 0).unwrap();
        let sampler = Sampler::new(
            fetcher.clone(),
            store.clone(),
            TraceFile::new(tmp.path().join("diskinfo")),
            boot,
        );
        let checker =
            ContinuityChecker::new(store.clone(), notifier.clone(), CheckSettings::default());
        let devices = vec![disk("sda", "S3R0NF0JB17727V")];

        // t1: power_cycle=5
        let t1 = boot + Duration::hours(1);
        sampler.run_pass_at(&devices, t1).await.unwrap();

        // t2: power_cycle=6, one clean restart
        fetcher.set_report("sda", sata_report(6), 0);
        sampler.run_pass_at(&devices, t1 + Duration::hours(1)).await.unwrap();

        let outcomes = checker.run_pass(&devices).await.unwrap();
        let verdict = outcomes[0].verdict().unwrap();
        assert_eq!(verdict.classification, Classification::Ok);
        assert_eq!(notifier.count(Severity::Critical), 0);

        // t3: power_cycle=9, the drive was powered elsewhere
        fetcher.set_report("sda", sata_report(9), 0);
        sampler.run_pass_at(&devices, t1 + Duration::hours(2)).await.unwrap();

        let outcomes = checker.run_pass(&devices).await.unwrap();
        let verdict = outcomes[0].verdict().unwrap();
        assert_eq!(verdict.classification, Classification::Tampered);
        assert_eq!((verdict.previous, verdict.current), (6, 9));
        assert_eq!(notifier.count(Severity::Critical), 1);
        assert_eq!(notifier.sent.lock().len(), 1);
    }
}
