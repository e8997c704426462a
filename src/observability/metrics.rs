use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub searches_total: IntCounterVec,
    pub search_latency_seconds: HistogramVec,
    pub reservations_total: IntCounterVec,
    pub active_intervals: IntGauge,
    pub catalog_units: IntGauge,
    pub catalog_refreshes_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let searches_total = IntCounterVec::new(
            Opts::new("searches_total", "Total availability searches by outcome"),
            &["outcome"],
        )
        .expect("valid searches_total metric");

        let search_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "search_latency_seconds",
                "Latency of availability searches in seconds",
            ),
            &["outcome"],
        )
        .expect("valid search_latency_seconds metric");

        let reservations_total = IntCounterVec::new(
            Opts::new("reservations_total", "Total interval reservations by outcome"),
            &["outcome"],
        )
        .expect("valid reservations_total metric");

        let active_intervals = IntGauge::new(
            "active_intervals",
            "Requested or confirmed booking intervals",
        )
        .expect("valid active_intervals metric");

        let catalog_units = IntGauge::new("catalog_units", "Fleet units in the live catalog")
            .expect("valid catalog_units metric");

        let catalog_refreshes_total = IntCounterVec::new(
            Opts::new("catalog_refreshes_total", "Catalog refreshes by outcome"),
            &["outcome"],
        )
        .expect("valid catalog_refreshes_total metric");

        registry
            .register(Box::new(searches_total.clone()))
            .expect("register searches_total");
        registry
            .register(Box::new(search_latency_seconds.clone()))
            .expect("register search_latency_seconds");
        registry
            .register(Box::new(reservations_total.clone()))
            .expect("register reservations_total");
        registry
            .register(Box::new(active_intervals.clone()))
            .expect("register active_intervals");
        registry
            .register(Box::new(catalog_units.clone()))
            .expect("register catalog_units");
        registry
            .register(Box::new(catalog_refreshes_total.clone()))
            .expect("register catalog_refreshes_total");

        Self {
            registry,
            searches_total,
            search_latency_seconds,
            reservations_total,
            active_intervals,
            catalog_units,
            catalog_refreshes_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
