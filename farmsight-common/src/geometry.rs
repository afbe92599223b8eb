//! GeoJSON polygon helpers
//!
//! Area uses a Web Mercator projection of the exterior ring and the
//! shoelace formula. This is a documented approximation good enough for
//! paddock-scale parcels, not survey-grade geodesy.

use serde_json::Value;

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Approximate polygon area in hectares.
///
/// Expects a GeoJSON Polygon value; a degenerate ring (fewer than four
/// points including the closing point) yields 0.0.
pub fn polygon_area_hectares(geom: &Value) -> f64 {
    let ring = exterior_ring(geom);
    if ring.len() < 4 {
        return 0.0;
    }

    let projected: Vec<(f64, f64)> = ring
        .iter()
        .map(|&(lon, lat)| lon_lat_to_mercator(lon, lat))
        .collect();

    let mut area_m2 = 0.0;
    for pair in projected.windows(2) {
        let (x1, y1) = pair[0];
        let (x2, y2) = pair[1];
        area_m2 += x1 * y2 - x2 * y1;
    }
    area_m2 = area_m2.abs() * 0.5;
    area_m2 / 10_000.0
}

/// Average of the exterior ring vertices, closing point excluded.
pub fn polygon_centroid(geom: &Value) -> (f64, f64) {
    let ring = exterior_ring(geom);
    if ring.is_empty() {
        return (0.0, 0.0);
    }
    let count = ring.len().saturating_sub(1).max(1);
    let lon_sum: f64 = ring[..ring.len() - 1].iter().map(|p| p.0).sum();
    let lat_sum: f64 = ring[..ring.len() - 1].iter().map(|p| p.1).sum();
    (lon_sum / count as f64, lat_sum / count as f64)
}

fn exterior_ring(geom: &Value) -> Vec<(f64, f64)> {
    geom.get("coordinates")
        .and_then(|coords| coords.get(0))
        .and_then(Value::as_array)
        .map(|points| {
            points
                .iter()
                .filter_map(|point| {
                    let lon = point.get(0)?.as_f64()?;
                    let lat = point.get(1)?.as_f64()?;
                    Some((lon, lat))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon.to_radians() * EARTH_RADIUS_M;
    // Clamp latitude so the projection stays finite near the poles
    let lat = lat.clamp(-89.5, 89.5);
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rectangle() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [174.75, -36.85],
                [174.752, -36.85],
                [174.752, -36.848],
                [174.75, -36.848],
                [174.75, -36.85],
            ]],
        })
    }

    #[test]
    fn test_polygon_area_hectares_is_positive() {
        let area = polygon_area_hectares(&rectangle());
        assert!(area > 0.0);
    }

    #[test]
    fn test_polygon_area_degenerate_ring_is_zero() {
        let geom = json!({
            "type": "Polygon",
            "coordinates": [[[174.75, -36.85], [174.752, -36.85]]],
        });
        assert_eq!(polygon_area_hectares(&geom), 0.0);
    }

    #[test]
    fn test_polygon_area_missing_coordinates_is_zero() {
        let geom = json!({ "type": "Polygon" });
        assert_eq!(polygon_area_hectares(&geom), 0.0);
    }

    #[test]
    fn test_polygon_centroid_inside_rectangle() {
        let (lon, lat) = polygon_centroid(&rectangle());
        assert!(lon > 174.75 && lon < 174.752);
        assert!(lat > -36.85 && lat < -36.848);
    }

    #[test]
    fn test_polygon_centroid_empty_ring() {
        let geom = json!({ "type": "Polygon", "coordinates": [[]] });
        assert_eq!(polygon_centroid(&geom), (0.0, 0.0));
    }
}
