//! Maps `Box<dyn Error>` from trait boundaries to a typed `LockError`.

use crate::error::LockError;

/// Map a sensor/actuator error to a `LockError`.
///
/// Known hardware error types are downcast first; anything else falls back
/// to a string check for timeouts.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> LockError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<bias_hardware::HwError>() {
            return match hw {
                bias_hardware::HwError::Timeout => LockError::Timeout,
                other => LockError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        LockError::Timeout
    } else {
        LockError::Hardware(s)
    }
}
