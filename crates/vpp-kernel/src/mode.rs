//! Control-mode dispatch table.
//!
//! Each [`ControlMode`] enables a fixed set of actuation sub-routines.  The
//! table is a plain `match`, so adding a mode is a compile error until every
//! column is decided.
//!
//! | Mode | Signal | Steer | Gear | Accel |
//! |---|---|---|---|---|
//! | `NoCommand` | – | – | – | – |
//! | `Autonomous` | ✓ | ✓ | ✓ | ✓ |
//! | `AutonomousSteerOnly` | ✓ | ✓ | ✓ | – |
//! | `AutonomousVelocityOnly` | ✓ | – | ✓ | ✓ |
//! | `Manual`, `Disengaged`, `NotReady` | – | – | – | – |

use tracing::warn;
use vpp_types::ControlMode;

/// Which sub-routines run on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Subroutines {
    pub signal: bool,
    pub steer: bool,
    pub gear: bool,
    pub accel: bool,
}

impl Subroutines {
    pub const NONE: Subroutines = Subroutines {
        signal: false,
        steer: false,
        gear: false,
        accel: false,
    };

    pub const ALL: Subroutines = Subroutines {
        signal: true,
        steer: true,
        gear: true,
        accel: true,
    };
}

/// Sub-routines enabled by `mode`.
pub fn subroutines(mode: ControlMode) -> Subroutines {
    match mode {
        ControlMode::Autonomous => Subroutines::ALL,
        ControlMode::AutonomousSteerOnly => Subroutines {
            accel: false,
            ..Subroutines::ALL
        },
        ControlMode::AutonomousVelocityOnly => Subroutines {
            steer: false,
            ..Subroutines::ALL
        },
        ControlMode::NoCommand
        | ControlMode::Manual
        | ControlMode::Disengaged
        | ControlMode::NotReady => Subroutines::NONE,
    }
}

/// Decode a wire control-mode code.  Unknown codes are logged and treated as
/// [`ControlMode::NoCommand`], so the vehicle is left alone.
pub fn mode_from_wire(code: u8) -> ControlMode {
    ControlMode::try_from(code).unwrap_or_else(|e| {
        warn!(code, error = %e, "Unrecognized control mode, treating as NoCommand");
        ControlMode::NoCommand
    })
}
