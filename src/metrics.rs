//! Prometheus metrics for the scheduler, engine and HTTP front end

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,

    pub ticks_total: IntCounter,
    pub ticks_skipped_total: IntCounter,
    pub ticks_failed_total: IntCounter,
    pub tick_duration_seconds: Histogram,
    pub transitions_total: IntCounter,
    pub fetch_failures_total: IntCounter,
    pub notification_failures_total: IntCounter,
    pub watchlist_size: IntGauge,

    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks_total = IntCounter::new("ticks_total", "Crossover ticks completed")?;
        let ticks_skipped_total = IntCounter::new(
            "ticks_skipped_total",
            "Ticks skipped because another tick was in flight",
        )?;
        let ticks_failed_total =
            IntCounter::new("ticks_failed_total", "Ticks that failed to persist status")?;
        let tick_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("tick_duration_seconds", "Duration of a crossover tick")
                .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )?;
        let transitions_total =
            IntCounter::new("transitions_total", "Crossover transitions emitted")?;
        let fetch_failures_total = IntCounter::new(
            "fetch_failures_total",
            "Indicator fetches that returned no usable data",
        )?;
        let notification_failures_total = IntCounter::new(
            "notification_failures_total",
            "Notification batches the transport failed to deliver",
        )?;
        let watchlist_size = IntGauge::new("watchlist_size", "Tickers on the watchlist")?;

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(ticks_skipped_total.clone()))?;
        registry.register(Box::new(ticks_failed_total.clone()))?;
        registry.register(Box::new(tick_duration_seconds.clone()))?;
        registry.register(Box::new(transitions_total.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(notification_failures_total.clone()))?;
        registry.register(Box::new(watchlist_size.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            ticks_skipped_total,
            ticks_failed_total,
            tick_duration_seconds,
            transitions_total,
            fetch_failures_total,
            notification_failures_total,
            watchlist_size,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        })
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
