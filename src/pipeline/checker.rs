//! Continuity Pass
//!
//! Reads the two most recent samples of each enumerated device, evaluates
//! the power-cycle transition between them and raises alerts.

use crate::config::WatcherConfig;
use crate::continuity::{evaluate, ContinuityVerdict, RegressionPolicy, VerdictReason};
use crate::domain::ports::{DeviceIdentity, EventStore, Notifier, Severity};
use crate::domain::serial_fingerprint;
use crate::error::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

// =============================================================================
// Outcomes
// =============================================================================

/// What happened to one device during a continuity pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Fewer than two samples are stored for this device
    InsufficientHistory { device: String, recorded: usize },
    /// The device has no serial number to look history up by
    NoSerial { device: String },
    /// The last two samples were compared
    Evaluated {
        device: String,
        verdict: ContinuityVerdict,
    },
}

impl CheckOutcome {
    pub fn verdict(&self) -> Option<&ContinuityVerdict> {
        match self {
            CheckOutcome::Evaluated { verdict, .. } => Some(verdict),
            _ => None,
        }
    }
}

// =============================================================================
// Checker Settings
// =============================================================================

/// Alerting behavior of the continuity pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSettings {
    pub always_notify: bool,
    pub notify_timeout_ms: u32,
    pub counter_regression: RegressionPolicy,
}

impl From<&WatcherConfig> for CheckSettings {
    fn from(config: &WatcherConfig) -> Self {
        Self {
            always_notify: config.always_notify,
            notify_timeout_ms: config.notify_timeout_ms,
            counter_regression: config.counter_regression,
        }
    }
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self::from(&WatcherConfig::default())
    }
}

// =============================================================================
// Continuity Checker
// =============================================================================

/// Runs continuity passes against a store and a notifier
pub struct ContinuityChecker {
    store: Arc<dyn EventStore>,
    notifier: Arc<dyn Notifier>,
    settings: CheckSettings,
}

impl ContinuityChecker {
    pub fn new(
        store: Arc<dyn EventStore>,
        notifier: Arc<dyn Notifier>,
        settings: CheckSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    /// Check every device once; store errors abort the pass
    pub async fn run_pass(&self, devices: &[DeviceIdentity]) -> Result<Vec<CheckOutcome>> {
        let mut outcomes = Vec::with_capacity(devices.len());
        for device in devices {
            outcomes.push(self.check_device(device).await?);
        }

        let tampered = outcomes
            .iter()
            .filter_map(CheckOutcome::verdict)
            .filter(|v| v.is_tampered())
            .count();
        info!(
            "Continuity pass complete: {} devices, {} tampered",
            outcomes.len(),
            tampered
        );

        Ok(outcomes)
    }

    /// Compare the two most recent samples of one device
    pub async fn check_device(&self, device: &DeviceIdentity) -> Result<CheckOutcome> {
        let dev = device.device_path();

        if device.serial.is_empty() {
            info!("{} has no serial number, skipping!", dev);
            return Ok(CheckOutcome::NoSerial {
                device: device.kname.clone(),
            });
        }

        let events = self
            .store
            .last_two(&serial_fingerprint(&device.serial))
            .await?;

        let (current, previous) = match events.as_slice() {
            [current, previous, ..] => (current, previous),
            _ => {
                info!(
                    "{} {} has less than two events recorded, skipping!",
                    dev, device.serial
                );
                return Ok(CheckOutcome::InsufficientHistory {
                    device: device.kname.clone(),
                    recorded: events.len(),
                });
            }
        };

        let verdict = evaluate(
            previous.sample(),
            current.sample(),
            self.settings.counter_regression,
        );
        self.report(&dev, &device.serial, &verdict).await;

        Ok(CheckOutcome::Evaluated {
            device: device.kname.clone(),
            verdict,
        })
    }

    async fn report(&self, dev: &str, serial: &str, verdict: &ContinuityVerdict) {
        let base = format!(
            "{} {} \nSMART PowerCycleCount: prev={} now={}",
            dev, serial, verdict.previous, verdict.current
        );

        if verdict.is_tampered() {
            let message = format!("Device tampering! {}", base);
            error!(
                severity = "critical",
                device = dev,
                prev = verdict.previous,
                current = verdict.current,
                "{}",
                message.replace('\n', "-")
            );
            self.send(&message, Severity::Critical).await;
            return;
        }

        let message = format!("OK {}", base);
        if verdict.reason == VerdictReason::CounterRegression {
            warn!(
                device = dev,
                prev = verdict.previous,
                current = verdict.current,
                "Power-cycle counter went backwards, tolerated by policy: {}",
                message.replace('\n', "-")
            );
        } else {
            info!("{}", message.replace('\n', "-"));
        }

        if self.settings.always_notify {
            self.send(&message, Severity::Normal).await;
        }
    }

    async fn send(&self, message: &str, severity: Severity) {
        if let Err(e) = self
            .notifier
            .notify(message, severity, self.settings.notify_timeout_ms)
            .await
        {
            warn!(%severity, "Notification failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuity::Classification;
    use crate::domain::ports::{NewEvent, NormalizedSample, SamplePayload};
    use crate::pipeline::testing::{disk, RecordingNotifier};
    use crate::storage::SqliteEventStore;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    async fn store_with(serial: &str, cycles: &[u64]) -> Arc<SqliteEventStore> {
        let store = Arc::new(SqliteEventStore::in_memory().unwrap());
        let device = disk("sda", serial);
        let start = Utc::now();

        for (i, &power_cycle_count) in cycles.iter().enumerate() {
            let event = NewEvent {
                dev: device.device_path(),
                serial: serial.into(),
                serial_fingerprint: serial_fingerprint(serial),
                dt: start + Duration::minutes(i as i64),
                dt_boot: start,
                payload: SamplePayload::new(
                    &device,
                    NormalizedSample {
                        power_on_hours: 10,
                        power_cycle_count,
                        host_read_bytes: 0,
                        host_write_bytes: 0,
                        status: "OK".into(),
                    },
                ),
            };
            store.append(&event).await.unwrap();
        }
        store
    }

    fn checker(
        store: Arc<SqliteEventStore>,
        notifier: Arc<RecordingNotifier>,
        settings: CheckSettings,
    ) -> ContinuityChecker {
        ContinuityChecker::new(store, notifier, settings)
    }

    #[tokio::test]
    async fn test_insufficient_history() {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = store_with("S1", &[5]).await;
        let checker = checker(store, notifier.clone(), CheckSettings::default());

        let outcome = checker.check_device(&disk("sda", "S1")).await.unwrap();
        assert_matches!(outcome, CheckOutcome::InsufficientHistory { recorded: 1, .. });
        assert!(notifier.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_ok_is_silent_by_default() {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = store_with("S1", &[5, 6]).await;
        let checker = checker(store, notifier.clone(), CheckSettings::default());

        let outcome = checker.check_device(&disk("sda", "S1")).await.unwrap();
        let verdict = outcome.verdict().unwrap();
        assert_eq!(verdict.classification, Classification::Ok);
        assert_eq!((verdict.previous, verdict.current), (5, 6));
        assert!(notifier.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_always_notify() {
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = CheckSettings {
            always_notify: true,
            ..CheckSettings::default()
        };
        let checker = checker(store_with("S1", &[5, 5]).await, notifier.clone(), settings);

        checker.check_device(&disk("sda", "S1")).await.unwrap();
        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Severity::Normal);
        assert!(sent[0].0.starts_with("OK /dev/sda S1"));
    }

    #[tokio::test]
    async fn test_tampering_notifies_critical() {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = store_with("S1", &[5, 6, 9]).await;
        let checker = checker(store, notifier.clone(), CheckSettings::default());

        let outcome = checker.check_device(&disk("sda", "S1")).await.unwrap();
        let verdict = outcome.verdict().unwrap();
        assert!(verdict.is_tampered());
        assert_eq!((verdict.previous, verdict.current), (6, 9));

        assert_eq!(notifier.count(Severity::Critical), 1);
        let sent = notifier.sent.lock();
        assert_eq!(
            sent[0].0,
            "Device tampering! /dev/sda S1 \nSMART PowerCycleCount: prev=6 now=9"
        );
    }

    #[tokio::test]
    async fn test_regression_policy() {
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = CheckSettings {
            counter_regression: RegressionPolicy::Tolerate,
            ..CheckSettings::default()
        };
        let checker = checker(store_with("S1", &[5, 0]).await, notifier.clone(), settings);

        let outcome = checker.check_device(&disk("sda", "S1")).await.unwrap();
        assert_eq!(outcome.verdict().unwrap().classification, Classification::Ok);
        assert_eq!(notifier.count(Severity::Critical), 0);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_pass() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let store = store_with("S1", &[1, 4]).await;
        let checker = checker(store, notifier.clone(), CheckSettings::default());

        let outcomes = checker
            .run_pass(&[disk("sda", "S1"), disk("sdb", "")])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].verdict().unwrap().is_tampered());
        assert_matches!(&outcomes[1], CheckOutcome::NoSerial { device } if device == "sdb");
        assert_eq!(notifier.count(Severity::Critical), 1);
    }

    #[test]
    fn test_settings_from_config() {
        let config = WatcherConfig {
            always_notify: true,
            notify_timeout_ms: 500,
            ..WatcherConfig::default()
        };
        let settings = CheckSettings::from(&config);
        assert!(settings.always_notify);
        assert_eq!(settings.notify_timeout_ms, 500);
        assert_eq!(settings.counter_regression, RegressionPolicy::Tampered);
    }
}
