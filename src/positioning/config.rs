/// Tunables for the positioning pipeline.
#[derive(Debug, Clone)]
pub struct PositioningConfig {
    /// Reference RSSI at 1 metre, in dBm
    pub rssi_at_1m: f64,

    /// Path loss exponent (2.0 = free space, 2.5-4.0 = indoor/urban)
    pub path_loss_exponent: f64,

    /// EMA weight given to a new estimate versus the stored position
    pub smoothing_alpha: f64,

    /// Number of recent positions returned by the trajectory query
    pub trajectory_window: usize,
}

impl Default for PositioningConfig {
    fn default() -> Self {
        Self {
            rssi_at_1m: -50.0,
            path_loss_exponent: 3.0,
            smoothing_alpha: 0.4,
            trajectory_window: 100,
        }
    }
}
