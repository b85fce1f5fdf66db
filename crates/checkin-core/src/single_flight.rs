use std::collections::HashSet;
use std::sync::Mutex;

use chain_sol::bytes_to_address;

use crate::error::ProtocolError;

/// At most one mutating operation per owner at a time.
#[derive(Debug, Default)]
pub struct SingleFlight {
    in_flight: Mutex<HashSet<[u8; 32]>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `owner`'s slot until the returned guard is dropped.
    pub fn try_acquire(&self, owner: &[u8; 32]) -> Result<FlightGuard<'_>, ProtocolError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(*owner) {
            return Err(ProtocolError::OperationInFlight {
                owner: bytes_to_address(owner),
            });
        }
        Ok(FlightGuard {
            flights: self,
            owner: *owner,
        })
    }

    pub fn is_in_flight(&self, owner: &[u8; 32]) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(owner)
    }
}

#[derive(Debug)]
pub struct FlightGuard<'a> {
    flights: &'a SingleFlight,
    owner: [u8; 32],
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flights
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_for_same_owner_fails() {
        let flights = SingleFlight::new();
        let _guard = flights.try_acquire(&[1u8; 32]).unwrap();

        let err = flights.try_acquire(&[1u8; 32]).unwrap_err();
        assert!(matches!(err, ProtocolError::OperationInFlight { .. }));
    }

    #[test]
    fn different_owners_do_not_block_each_other() {
        let flights = SingleFlight::new();
        let _a = flights.try_acquire(&[1u8; 32]).unwrap();
        assert!(flights.try_acquire(&[2u8; 32]).is_ok());
    }

    #[test]
    fn dropping_the_guard_releases_the_owner() {
        let flights = SingleFlight::new();
        {
            let _guard = flights.try_acquire(&[1u8; 32]).unwrap();
            assert!(flights.is_in_flight(&[1u8; 32]));
        }
        assert!(!flights.is_in_flight(&[1u8; 32]));
        assert!(flights.try_acquire(&[1u8; 32]).is_ok());
    }
}
