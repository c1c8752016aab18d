pub mod bridge;
pub mod coeff_cache;
pub mod fir;
pub mod kernel;
pub mod processor;
pub mod response;
pub mod window;

pub use bridge::{SilenceGate, WorkingBuffer};
pub use coeff_cache::{CoefficientCache, DesignParams, KernelUpdate};
pub use fir::{Bypass, DualFirEngine, FirStage, StageState};
pub use kernel::{FilterKind, Kernel, KernelDesign, MAX_TAPS};
pub use processor::{BlockOutcome, FirProcessor};
pub use window::WindowKind;
