//! Fallback input source
//!
//! While no sensor board is connected the readings follow manually supplied
//! fractions (one per field, `[0, 1]`). Producers publish through
//! [`FallbackInput`]; the acquisition loop reads the latest value through a
//! [`FallbackSubscription`]. Both ends share a `tokio::sync::watch` channel so
//! only the newest fractions are kept.

use ambifan_core::{Fractions, SensorField};
use tokio::sync::watch;
use tracing::debug;

/// Anything that can supply fallback fractions
pub trait FallbackSource {
    fn fractions(&self) -> Fractions;
}

impl FallbackSource for Fractions {
    fn fractions(&self) -> Fractions {
        *self
    }
}

/// Publishing side of the fallback channel
#[derive(Debug)]
pub struct FallbackInput {
    tx: watch::Sender<Fractions>,
}

impl FallbackInput {
    /// Start from `initial`, clamped to `[0, 1]`.
    pub fn new(initial: Fractions) -> Self {
        let (tx, _rx) = watch::channel(initial.clamped());
        Self { tx }
    }

    /// Update one field. The value is clamped to `[0, 1]`.
    pub fn set(&self, field: SensorField, fraction: f32) {
        self.tx.send_modify(|fractions| fractions.set(field, fraction));
        debug!("Fallback {} set to {:.3}", field, self.current().get(field));
    }

    pub fn current(&self) -> Fractions {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> FallbackSubscription {
        FallbackSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for FallbackInput {
    fn default() -> Self {
        Self::new(Fractions::default())
    }
}

/// Receiving side of the fallback channel
#[derive(Debug, Clone)]
pub struct FallbackSubscription {
    rx: watch::Receiver<Fractions>,
}

impl FallbackSource for FallbackSubscription {
    fn fractions(&self) -> Fractions {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_sees_latest_value() {
        let input = FallbackInput::default();
        let sub = input.subscribe();

        input.set(SensorField::Temperature, 0.25);
        input.set(SensorField::Temperature, 0.75);
        input.set(SensorField::Gas, 0.5);

        let fractions = sub.fractions();
        assert_eq!(fractions.temperature, 0.75);
        assert_eq!(fractions.gas, 0.5);
        assert_eq!(fractions.humidity, 0.0);
    }

    #[test]
    fn test_set_clamps() {
        let input = FallbackInput::default();
        input.set(SensorField::Humidity, 3.0);
        assert_eq!(input.current().humidity, 1.0);

        input.set(SensorField::Gas, f32::NAN);
        assert_eq!(input.current().gas, 0.0);
    }

    #[test]
    fn test_initial_fractions_are_clamped() {
        let input = FallbackInput::new(Fractions {
            temperature: f32::NAN,
            humidity: 0.5,
            gas: 2.0,
        });

        let current = input.subscribe().fractions();
        assert_eq!(current.temperature, 0.0);
        assert_eq!(current.humidity, 0.5);
        assert_eq!(current.gas, 1.0);
    }
}
