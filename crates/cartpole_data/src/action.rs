use serde::{Deserialize, Serialize};

/// Control action applied to the cart for one tick.
///
/// This is a closed set checked at the decision-source boundary; the cart
/// never receives free-form action values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Accelerate the cart towards negative x.
    Left,
    /// Accelerate the cart towards positive x.
    Right,
    /// No thrust. The cart either hard-stops or coasts with friction,
    /// depending on the configured idle response.
    Idle,
}

impl Action {
    /// All actions in the scoring order used by three-output policies:
    /// index 0 pushes left, 1 idles, 2 pushes right.
    pub const SCORED: [Action; 3] = [Action::Left, Action::Idle, Action::Right];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_order() {
        assert_eq!(Action::SCORED[0], Action::Left);
        assert_eq!(Action::SCORED[1], Action::Idle);
        assert_eq!(Action::SCORED[2], Action::Right);
    }
}
