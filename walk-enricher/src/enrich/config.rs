//! Driver configuration.

/// Configuration parameters for an enrichment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    /// Number of nearest stops to route to from each address.
    pub stops_per_address: usize,

    /// Maximum routing queries awaited together for one address.
    /// `1` gives the strictly sequential behaviour.
    pub max_in_flight: usize,
}

impl EnrichConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(stops_per_address: usize, max_in_flight: usize) -> Self {
        Self {
            stops_per_address,
            max_in_flight,
        }
    }

    /// Set the number of stops per address.
    pub fn with_stops_per_address(mut self, n: usize) -> Self {
        self.stops_per_address = n;
        self
    }

    /// Set the number of concurrent routing queries.
    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n;
        self
    }

    /// Check the parameters describe a run that can make progress.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.stops_per_address == 0 {
            return Err("stops_per_address must be at least 1");
        }
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be at least 1");
        }
        Ok(())
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            stops_per_address: 5,
            max_in_flight: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EnrichConfig::default();
        assert_eq!(config.stops_per_address, 5);
        assert_eq!(config.max_in_flight, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder() {
        let config = EnrichConfig::default()
            .with_stops_per_address(3)
            .with_max_in_flight(4);
        assert_eq!(config, EnrichConfig::new(3, 4));
    }

    #[test]
    fn zero_values_rejected() {
        assert!(EnrichConfig::new(0, 1).validate().is_err());
        assert!(EnrichConfig::new(5, 0).validate().is_err());
    }
}
