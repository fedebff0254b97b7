/// Serializes every plot type once so their typetag registrations survive
/// linking and `config.yaml` can name them.
pub fn init_plots() {
    serde_json::to_string(&throughput_basic::ThroughputBars::default()).unwrap();
}
