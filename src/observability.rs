use biometrics::{Collector, Counter, Moments};

pub(crate) static CONNECTION_OPENS: Counter = Counter::new("dmchat.connection.opens");
pub(crate) static CONNECTION_OPEN_ERRORS: Counter = Counter::new("dmchat.connection.open_errors");
pub(crate) static CONNECTION_CLOSES: Counter = Counter::new("dmchat.connection.closes");

pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("dmchat.stream.fragments");
pub(crate) static STREAM_SENTINELS: Counter = Counter::new("dmchat.stream.sentinels");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("dmchat.stream.errors");

pub(crate) static EXCHANGE_IDLE_FINALIZES: Counter = Counter::new("dmchat.exchange.idle_finalizes");
pub(crate) static EXCHANGE_CLOSE_FINALIZES: Counter =
    Counter::new("dmchat.exchange.close_finalizes");
pub(crate) static EXCHANGE_DURATION: Moments = Moments::new("dmchat.exchange.duration_seconds");

pub(crate) static PROVISION_REQUESTS: Counter = Counter::new("dmchat.provision.requests");
pub(crate) static PROVISION_ERRORS: Counter = Counter::new("dmchat.provision.errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CONNECTION_OPENS);
    collector.register_counter(&CONNECTION_OPEN_ERRORS);
    collector.register_counter(&CONNECTION_CLOSES);

    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_SENTINELS);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&EXCHANGE_IDLE_FINALIZES);
    collector.register_counter(&EXCHANGE_CLOSE_FINALIZES);
    collector.register_moments(&EXCHANGE_DURATION);

    collector.register_counter(&PROVISION_REQUESTS);
    collector.register_counter(&PROVISION_ERRORS);
}
