//! Turn / hazard arbitration.

use vpp_types::{TurnSignal, VehicleSignal};

/// Collapse a turn request and a hazard flag into one vehicle signal.
///
/// Hazard overrides any turn request; otherwise the turn request passes
/// through unchanged.
///
/// ```
/// use vpp_kernel::resolve;
/// use vpp_types::{TurnSignal, VehicleSignal};
///
/// assert_eq!(resolve(TurnSignal::Left, true), VehicleSignal::Hazard);
/// assert_eq!(resolve(TurnSignal::Right, false), VehicleSignal::Right);
/// ```
pub fn resolve(turn: TurnSignal, hazard: bool) -> VehicleSignal {
    if hazard {
        return VehicleSignal::Hazard;
    }
    match turn {
        TurnSignal::None => VehicleSignal::None,
        TurnSignal::Left => VehicleSignal::Left,
        TurnSignal::Right => VehicleSignal::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truth_table() {
        let cases = [
            (TurnSignal::None, false, VehicleSignal::None),
            (TurnSignal::Left, false, VehicleSignal::Left),
            (TurnSignal::Right, false, VehicleSignal::Right),
            (TurnSignal::None, true, VehicleSignal::Hazard),
            (TurnSignal::Left, true, VehicleSignal::Hazard),
            (TurnSignal::Right, true, VehicleSignal::Hazard),
        ];
        for (turn, hazard, expected) in cases {
            assert_eq!(resolve(turn, hazard), expected, "{turn:?} hazard={hazard}");
        }
    }
}
