//! Wire types for the Mapbox Directions API.
//!
//! Only the fields the enricher reads are modelled; serde ignores the rest
//! (geometry, legs, waypoints).

use serde::Deserialize;

/// Top-level Directions API response.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    /// `"Ok"` on success, otherwise an error code such as `"NoRoute"`.
    pub code: String,

    /// Human-readable detail for error codes.
    #[serde(default)]
    pub message: Option<String>,

    /// Candidate routes, best first. Empty when `code` is not `"Ok"`.
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

/// One route from the Directions API.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsRoute {
    /// Distance travelled, in meters.
    pub distance: f64,

    /// Estimated travel time, in seconds.
    pub duration: f64,
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ok_response() {
        let json = r#"{
            "code": "Ok",
            "routes": [
                {"distance": 412.3, "duration": 297.1, "weight": 297.1, "legs": []},
                {"distance": 500.0, "duration": 360.0}
            ],
            "waypoints": [],
            "uuid": "abc"
        }"#;
        let resp: DirectionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code, "Ok");
        assert_eq!(resp.routes.len(), 2);
        assert_eq!(resp.routes[0].distance, 412.3);
        assert_eq!(resp.routes[0].duration, 297.1);
    }

    #[test]
    fn parse_no_route_response() {
        let json = r#"{"code": "NoRoute", "message": "No route found"}"#;
        let resp: DirectionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code, "NoRoute");
        assert_eq!(resp.message.as_deref(), Some("No route found"));
        assert!(resp.routes.is_empty());
    }

    #[test]
    fn parse_error_body() {
        let json = r#"{"message": "Not Authorized - Invalid Token"}"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.message, "Not Authorized - Invalid Token");
    }
}
