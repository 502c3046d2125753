/// Emitted after every receding-horizon iteration of [`crate::Mpc`].
#[derive(Debug, Clone, PartialEq)]
pub struct MpcProgressEvent {
    /// 1-based iteration count.
    pub step: usize,
    pub window_start: f64,
    pub window_end: f64,
    pub fraction_complete: f64,
    /// Wall-clock seconds since the run started.
    pub elapsed_wall_s: f64,
}
