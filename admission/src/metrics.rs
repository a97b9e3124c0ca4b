//! Prometheus metrics for admission and greeting activity.
//!
//! [`GateMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

pub struct GateMetrics {
    pub registry: Registry,

    /// Every `/join` attempt that reached the controller.
    pub join_attempts: IntCounter,
    /// Attempts that ended with an invite link.
    pub admissions: IntCounter,
    /// Failed attempts, labelled by `reason`.
    pub rejections: IntCounterVec,
    /// Reservations undone after invite issuance failed.
    pub rollbacks: IntCounter,
    /// Slots in use, as of the last observation.
    pub spots_used: IntGauge,
    /// Welcome messages delivered.
    pub greetings_sent: IntCounter,
    /// Welcome messages that could not be delivered.
    pub greetings_failed: IntCounter,
}

impl GateMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let join_attempts = register_int_counter_with_registry!(
            Opts::new("spotgate_join_attempts_total", "Total join attempts"),
            registry
        )
        .expect("failed to register join_attempts counter");

        let admissions = register_int_counter_with_registry!(
            Opts::new(
                "spotgate_admissions_total",
                "Join attempts that produced an invite link"
            ),
            registry
        )
        .expect("failed to register admissions counter");

        let rejections = register_int_counter_vec_with_registry!(
            Opts::new("spotgate_rejections_total", "Failed join attempts by reason"),
            &["reason"],
            registry
        )
        .expect("failed to register rejections counter");

        let rollbacks = register_int_counter_with_registry!(
            Opts::new(
                "spotgate_rollbacks_total",
                "Reservations deleted after invite issuance failed"
            ),
            registry
        )
        .expect("failed to register rollbacks counter");

        let spots_used = register_int_gauge_with_registry!(
            Opts::new("spotgate_spots_used", "Admission slots currently in use"),
            registry
        )
        .expect("failed to register spots_used gauge");

        let greetings_sent = register_int_counter_with_registry!(
            Opts::new("spotgate_greetings_sent_total", "Welcome messages sent"),
            registry
        )
        .expect("failed to register greetings_sent counter");

        let greetings_failed = register_int_counter_with_registry!(
            Opts::new(
                "spotgate_greetings_failed_total",
                "Welcome messages that failed to send"
            ),
            registry
        )
        .expect("failed to register greetings_failed counter");

        Self {
            registry,
            join_attempts,
            admissions,
            rejections,
            rollbacks,
            spots_used,
            greetings_sent,
            greetings_failed,
        }
    }

    /// Record a failed attempt under its reason label.
    pub fn record_rejection(&self, reason: &str) {
        self.rejections.with_label_values(&[reason]).inc();
    }

    pub fn set_spots_used(&self, used: u64) {
        self.spots_used.set(i64::try_from(used).unwrap_or(i64::MAX));
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for GateMetrics {
    fn default() -> Self {
        Self::new()
    }
}
