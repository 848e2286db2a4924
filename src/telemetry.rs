//! Tracing setup for hosts and tests

use tracing::Level;

/// Install a `fmt` subscriber at `level` for hosts and tests.
///
/// Returns `false` when a global subscriber was already installed, which is
/// the normal case when several tests call this.
pub fn init_tracing(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_repeatable() {
        init_tracing(Level::DEBUG);
        assert!(!init_tracing(Level::DEBUG));
    }
}
